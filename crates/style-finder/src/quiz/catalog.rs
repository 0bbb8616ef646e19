use serde::Serialize;

use super::domain::{Polarity, StyleCategory};

/// Static copy backing the results page for a primary style.
#[derive(Debug, Clone, Serialize)]
pub struct StyleDescription {
    pub id: StyleCategory,
    pub name: &'static str,
    pub slug: String,
    pub polarity: Polarity,
    pub description: &'static str,
    pub characteristics: &'static [&'static str],
    pub colors: &'static [&'static str],
    pub keywords: &'static [&'static str],
}

pub fn describe(category: StyleCategory) -> StyleDescription {
    let (description, characteristics, colors, keywords): (
        &'static str,
        &'static [&'static str],
        &'static [&'static str],
        &'static [&'static str],
    ) = match category {
        StyleCategory::Dramatic => (
            "Bold and theatrical. Your wardrobe makes a statement and expresses a dynamic personality.",
            &["Statement pieces", "Bold silhouettes", "Sculptural elements", "Avant-garde details"],
            &["Black", "Metallic gold", "Bold accents"],
            &["Bold", "Theatrical", "Statement-making", "Avant-garde"],
        ),
        StyleCategory::Whimsical => (
            "Playful and vintage-inspired. You mix prints, textures, and unique pieces that spark conversation.",
            &["Mixed prints", "Playful accessories", "Unique details", "Conversation starters"],
            &["Vibrant coral", "Turquoise", "Fun multicolors"],
            &["Playful", "Quirky", "Artistic", "Creative"],
        ),
        StyleCategory::Classic => (
            "Refined and timeless. Crisp, tailored pieces with understated sophistication.",
            &["Tailored silhouettes", "Timeless pieces", "Understated elegance", "Traditional elements"],
            &["Navy", "Camel", "Black", "White", "Brown"],
            &["Timeless", "Elegant", "Sophisticated", "Traditional"],
        ),
        StyleCategory::Romantic => (
            "Sensual and luxurious with a touch of softness. Flowing fabrics, rich textures, historical charm.",
            &["Flowing layers", "Rich textures", "Handcrafted details", "Vintage elements"],
            &["Purple", "Lavender", "Plum", "Mauve", "Deep rich tones"],
            &["Feminine", "Flowing", "Luxurious", "Nostalgic"],
        ),
        StyleCategory::Sporty => (
            "Athletic and energetic. Comfort and function lead, driven by an active lifestyle.",
            &["Comfortable fits", "Performance fabrics", "Athletic elements", "Multifunctional pieces"],
            &["Fire-engine red", "Bright blue", "Optic brights", "Neon", "Gray"],
            &["Active", "Comfortable", "Performance", "Energetic"],
        ),
        StyleCategory::Delicate => (
            "Graceful and light. Soft, refined looks with careful attention to proportion and gentle color.",
            &["Refined silhouettes", "Soft textures", "Pretty details", "Structured yet gentle"],
            &["Blush pink", "Soft lavender", "Pastels", "Muted shades"],
            &["Pretty", "Soft", "Refined", "Gentle"],
        ),
        StyleCategory::Contemporary => (
            "Minimal, modern, and future-forward. Clean lines and the latest designer pieces.",
            &["Clean lines", "Modern silhouettes", "Designer pieces", "Trend-forward"],
            &["Sleek silver", "Pure white", "Bold vibrant colors"],
            &["Modern", "Sleek", "Fashionable", "Trend-setting"],
        ),
        StyleCategory::Natural => (
            "Effortless and earthy. Simple, comfortable pieces in natural fibers with a relaxed feel.",
            &["Natural fibers", "Simple silhouettes", "Handcrafted touches", "Uncluttered style"],
            &["Olive green", "Earth tones", "Muted naturals"],
            &["Natural", "Comfortable", "Relaxed", "Earthy"],
        ),
    };

    StyleDescription {
        id: category,
        name: category.name(),
        slug: category.slug(),
        polarity: category.polarity(),
        description,
        characteristics,
        colors,
        keywords,
    }
}
