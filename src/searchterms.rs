//! Turning a plant name into storefront search terms.
//!
//! Shopify's storefront search is fairly literal, so searching for the plant
//! name alone finds little. We combine a few generic phrasings with curated
//! product names for well-known plant categories, and with any catalog
//! product whose name mentions the plant outright.

use lambda_runtime::tracing;
use once_cell::sync::Lazy;
use std::collections::HashSet;

/// The product names in our store, as of the last catalog review. Some
/// entries carry the store's own spelling.
const PRODUCT_CATALOG: &[&str] = &[
    "Drought Fertilizer",
    "Cactus Food",
    "Fish Super Food",
    "Desert Plants Fertilizer",
    "Indoor Plant Food",
    "Exotic Bulb Fertilizer",
    "Potted Plant Food",
    "Terrarium Fertilizer",
    "Fern Food",
    "Hydroponics Fertilizer",
    "House Plant Food",
    "Azalea Fertilizer",
    "Orchid Food",
    "Rhododendron Fertilizer",
    "Succulent Food",
    "Hanging Basket Plant Food",
    "Flowering Plant Food",
    "Tomato Fertilizer",
    "High Bulb Fertilizer",
    "Herb Fertilizer",
    "Tropical Plant Food",
    "Bulk Fertilizer",
    "Acid Plant Fertilizer",
    "Lily Bulb Fertilizer",
    "Rose Fertilizer",
    "Berry Fertilizer",
    "Pepper Fertilizer",
    "Fruit Food",
    "Strawberry Fertilizer",
    "Rubber Plant Food",
    "Monstera Deliciosa Plant Food",
    "Vegetable Fertilizer",
    "Tropical Fertilizer",
    "Garlic Fertilizer",
    "Sweet Potato Fertilizer",
    "Garden Fertilizer",
    "Plant Food Outdoor",
    "Plant Food",
    "All In One Fertilizer",
    "All Purpose NPK Fertilizer",
    "5-5-5 Fertilizer",
    "10-10-10 All Vegetables",
    "6-8-10 Fertilizer",
    "10-10-10 Fertilizer",
    "Water Fertilizer",
    "Seaweed Kelp",
    "MycorrhizalFungi For Trees",
    "MycorrhizalFungi For Shrubs",
    "MycorrhizalFungi For Container Trees",
    "MycorrhizalFungi For Onion Trees",
    "MycorrhizalFungi",
    "Sweet Pea Fertlizer",
    "Granulated For Plants",
    "Magic Tree Fertilzer",
    "Lawn Fertilizer",
    "Grass Fertilizer",
    "Plant Fertilizer",
    "Apple Tree Fertilizer",
    "Citrus Fertilizer",
    "Tree Fertilizer",
    "Vine Fertilizer",
    "Universal Feed",
    "Aromatic Tree Fertilizer",
    "Pear Tree Fertilizer",
    "Rosewood Fertilizer",
    "Fig Tree Fertilizer",
    "Magnolia Tree Fertilizer",
    "Maple Tree Fertilizer",
    "Cherry Tree Fertilizer",
    "Orange Tree Fertilizer",
    "Pine Tree Fertilizer",
    "Spruce Tree Fertilizer",
    "Sage Palm Fertilizer",
    "Olive Fertilizer",
    "Universal Root Food",
    "Bonsai Fertilizer",
    "Oak Tree Fertilizer",
    "Liquid Fertilizer",
    "Super Activated Fertilizer",
    "Cactus Fertilizer",
    "Agave Fertilizer",
    "Aloe Plant Fertilizer",
    "Indoor Plant Fertilizers",
    "Epsom Salt Food",
    "AquaPlus Liquid Plant Food",
    "NutrientPlus For Houseplants",
    "Organic Plant Food",
    "Catalytic Liquid Food",
    "Galactic Lemon Tree Fertilizer",
    "Galactic Rose Fertilizer",
    "Galactic Herb Fertilizer",
    "Crawler Bonsai Fertilizer",
    "Monstera Plant Supplement",
    "Pothos Plant Supplement",
    "Succulent Root Supplement",
    "Succulent Plant Supplement",
    "Fig Root Supplement",
    "Peace Fertilizer",
    "Philadendron Fertilizer",
    "Fern Fertilizer",
    "Ivy Food",
    "Lord of Paradise Fertilizer",
    "Money Plant Food",
    "Jade Fertilizer",
    "Tropical Plant Fertilizer",
    "Wilted Fertilizer",
    "Iron Fertilzer",
    "Fiddle Leaf Fig Plant Food",
    "Agapanthus Fertilizer",
    "African Violet Plant Food",
    "Vine Plant Food",
    "Anthurium Fertilizer",
    "Bamboo Fertilizer",
    "Norfolk Pine Fertilizer",
    "Calathea Plant Food",
    "Corn Plant Food",
    "Herbs Fertilzer",
    "Cacti Monstera Fertilizer",
    "Hibiscus Fertilizer",
    "Venus Fly Fertilizer",
    "Pineapple Fertilzer",
    "Liquid Plant Food",
    "Water Plant Fertilizer",
    "Hydrangea Fertilizer",
    "Blueberry Fertilizer",
    "Fish Emulsion Fertilizer",
    "Giant Vegetables",
    "Carhold Fertilizer",
    "Boston Fern Feed",
    "Worm Castings Concentrate",
    "Humus Extract 500 Compound",
    "Wonder Fuel",
    "Sulfur for Plants",
    "Phosphorus Fertilizer",
    "Nitrogen Fertilizer",
    "Pothos Sulfate For Plants",
    "Calcium Fertilizer",
    "Zinc For Plants",
    "Ammonium Nitrate Fertilizer",
    "Potassium Fertilizer",
    "Bat Guano Fertilizer",
    "Rowan Fertilizer",
    "Superphosphate",
    "Oysterphosphate",
    "Compound 1ns for Plants",
    "Compound 2dd",
    "CatNip For Plants",
    "Seaweed Extract For Plants",
    "pH++",
    "Fertilizante Para Plantas",
    "Fertilizante Para Arboles/Foliage",
    "Fertilizante Para Cesped",
    "Fertilizante Para Orquidea",
    "Fertilizante Para Plantas De Interior",
    "Fertilizante Para Bonsai",
];

/// Curated products for plant categories, keyed by a lowercase substring of
/// the plant name. When several keys match, the longest one wins.
const CATEGORY_PRODUCTS: &[(&str, &[&str])] = &[
    (
        "monstera",
        &[
            "Monstera Deliciosa Plant Food",
            "Monstera Plant Supplement",
            "Indoor Plant Food",
            "Tropical Plant Food",
            "Tropical Fertilizer",
            "Tropical Plant Fertilizer",
            "Cacti Monstera Fertilizer",
            "Potted Plant Food",
            "House Plant Food",
        ],
    ),
    (
        "succulent",
        &[
            "Succulent Food",
            "Succulent Root Supplement",
            "Succulent Plant Supplement",
            "Cactus Food",
            "Cactus Fertilizer",
            "Desert Plants Fertilizer",
            "Drought Fertilizer",
        ],
    ),
    ("orchid", &["Orchid Food", "Flowering Plant Food"]),
    (
        "fiddle leaf",
        &[
            "Fiddle Leaf Fig Plant Food",
            "Indoor Plant Food",
            "Tropical Plant Food",
        ],
    ),
    (
        "snake plant",
        &["Indoor Plant Food", "House Plant Food", "Drought Fertilizer"],
    ),
    (
        "philodendron",
        &[
            "Philadendron Fertilizer",
            "Indoor Plant Food",
            "Tropical Plant Food",
        ],
    ),
    ("fern", &["Fern Food", "Fern Fertilizer", "Boston Fern Feed"]),
    (
        "pothos",
        &[
            "Pothos Plant Supplement",
            "Pothos Sulfate For Plants",
            "Indoor Plant Food",
            "Vine Fertilizer",
            "Vine Plant Food",
        ],
    ),
    (
        "cactus",
        &[
            "Cactus Food",
            "Cactus Fertilizer",
            "Drought Fertilizer",
            "Desert Plants Fertilizer",
        ],
    ),
    (
        "tomato",
        &[
            "Tomato Fertilizer",
            "Vegetable Fertilizer",
            "10-10-10 All Vegetables",
        ],
    ),
    ("herb", &["Herb Fertilizer", "Galactic Herb Fertilizer"]),
    (
        "rose",
        &[
            "Rose Fertilizer",
            "Galactic Rose Fertilizer",
            "Flowering Plant Food",
        ],
    ),
    (
        "houseplant",
        &[
            "House Plant Food",
            "Indoor Plant Food",
            "NutrientPlus For Houseplants",
        ],
    ),
    ("ficus", &["Fiddle Leaf Fig Plant Food", "Indoor Plant Food"]),
    (
        "vegetable",
        &[
            "Vegetable Fertilizer",
            "10-10-10 All Vegetables",
            "Garden Fertilizer",
        ],
    ),
    (
        "plant",
        &[
            "Plant Food",
            "Plant Fertilizer",
            "Indoor Plant Food",
            "Universal Feed",
            "All Purpose NPK Fertilizer",
        ],
    ),
];

const GENERAL_TERMS: &[&str] = &[
    "Plant Food",
    "Plant Fertilizer",
    "All Purpose NPK Fertilizer",
    "Universal Feed",
];

const GENERIC_INDOOR_TERMS: &[&str] = &["Indoor Plant Food", "House Plant Food", "Liquid Fertilizer"];

/// Catalog names paired with their lowercase forms, for matching.
static LOWERCASE_CATALOG: Lazy<Vec<(String, &'static str)>> = Lazy::new(|| {
    PRODUCT_CATALOG
        .iter()
        .map(|p| (p.to_lowercase(), *p))
        .collect()
});

/// The longest category key contained in the (lowercased) plant name.
fn best_category(name_lower: &str) -> Option<(&'static str, &'static [&'static str])> {
    let mut best: Option<(&'static str, &'static [&'static str])> = None;

    for &(key, products) in CATEGORY_PRODUCTS {
        if name_lower.contains(key) && best.map_or(true, |(b, _)| key.len() > b.len()) {
            best = Some((key, products));
        }
    }

    best
}

/// Catalog products whose names contain the plant name.
fn catalog_matches(name_lower: &str) -> Vec<&'static str> {
    LOWERCASE_CATALOG
        .iter()
        .filter(|(lower, _)| lower.contains(name_lower))
        .map(|(_, original)| *original)
        .collect()
}

/// Generate search terms for a plant, most specific first, without
/// duplicates.
pub fn generate_search_terms(plant_name: &str) -> Vec<String> {
    let name_lower = plant_name.to_lowercase();

    let mut terms = vec![
        format!("{plant_name} fertilizer"),
        format!("{plant_name} plant food"),
    ];

    match best_category(&name_lower) {
        Some((key, products)) => {
            tracing::info!("found category match for {plant_name}: {key}");
            terms.extend(products.iter().map(|p| p.to_string()));
        }

        None => {
            tracing::info!("no category match for {plant_name}, using general terms");
            terms.extend(GENERAL_TERMS.iter().map(|p| p.to_string()));

            if name_lower.contains("plant") || name_lower.chars().count() < 5 {
                terms.extend(GENERIC_INDOOR_TERMS.iter().map(|p| p.to_string()));
            }
        }
    }

    let exact = catalog_matches(&name_lower);

    if !exact.is_empty() {
        tracing::info!("found catalog matches for {plant_name}: {exact:?}");
        let mut prioritized: Vec<String> = exact.into_iter().map(ToOwned::to_owned).collect();
        prioritized.append(&mut terms);
        terms = prioritized;
    }

    let mut seen = HashSet::new();
    terms.retain(|t| seen.insert(t.clone()));
    terms
}
