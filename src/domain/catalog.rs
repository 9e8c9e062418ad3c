//! Curated reference tables surfaced by the CLI and the keyword composer.

/// Île-de-France departments for quick filtering.
pub const IDF_DEPARTMENTS: &[(&str, &str)] = &[
    ("75", "75 – Paris"),
    ("77", "77 – Seine-et-Marne"),
    ("78", "78 – Yvelines"),
    ("91", "91 – Essonne"),
    ("92", "92 – Hauts-de-Seine"),
    ("93", "93 – Seine-Saint-Denis"),
    ("94", "94 – Val-de-Marne"),
    ("95", "95 – Val d'Oise"),
];

/// Human-readable catalog of the training CPV codes.
pub const CPV_CATALOG: &[(&str, &str, &str)] = &[
    ("80500000", "Formation professionnelle", "Services de formation"),
    ("80510000", "Formation du personnel", "Services de formation spécialisés"),
    ("80533100", "Formation en informatique", "Formation en technologies de l'information"),
    ("80570000", "Formation continue", "Services de formation continue"),
    ("80000000", "Enseignement et formation", "Enseignement et formation générale"),
    ("80553000", "Formation à distance", "Formation à distance"),
    ("79632000", "Conseil en formation", "Formation et conseil en gestion du personnel"),
    ("79952000", "Événements pédagogiques", "Organisation de séminaires / conférences"),
];

/// Keyword buckets: named term groups users can toggle instead of typing
/// search text by hand.
pub const KEYWORD_BUCKETS: &[(&str, &[&str])] = &[
    (
        "UX/UI",
        &["UX", "UI", "design d'interface", "recherche utilisateur", "prototypage", "Figma", "ergonomie"],
    ),
    (
        "3D / Motion",
        &["3D", "motion design", "animation", "After Effects", "Cinema 4D", "Blender"],
    ),
    (
        "Unity / Unreal",
        &["Unity", "Unreal", "jeu vidéo", "temps réel", "VR", "AR", "XR"],
    ),
    (
        "IA créatives",
        &["intelligence artificielle", "IA générative", "Stable Diffusion", "Midjourney", "prompt", "création assistée"],
    ),
    (
        "Data / BI",
        &["data", "Power BI", "Excel avancé", "Tableau", "analyse de données", "visualisation"],
    ),
    (
        "Dev Web",
        &["développement web", "JavaScript", "TypeScript", "React", "Next.js", "Node.js"],
    ),
    (
        "Marketing digital",
        &["marketing digital", "SEO", "SEA", "social media", "campagnes", "automation"],
    ),
    (
        "Soft skills / Management",
        &["management", "prise de parole", "communication", "gestion de projet", "agilité", "scrum"],
    ),
];

/// Terms of one bucket, empty for unknown names.
pub fn bucket_terms(name: &str) -> &'static [&'static str] {
    KEYWORD_BUCKETS
        .iter()
        .find(|(bucket, _)| *bucket == name)
        .map(|(_, terms)| *terms)
        .unwrap_or(&[])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bucket_terms_known() {
        assert!(bucket_terms("Dev Web").contains(&"TypeScript"));
    }

    #[test]
    fn test_bucket_terms_unknown_is_empty() {
        assert!(bucket_terms("nope").is_empty());
    }
}
