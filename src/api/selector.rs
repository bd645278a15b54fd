use super::types::*;

const AUDIO_KEYWORDS: &[&str] = &["headphones", "earbuds"];

/// Pick the canned recommendation set for a chat message.
///
/// Any message mentioning headphones or earbuds (case-insensitive) gets the
/// noise-canceling headphone picks; everything else, including an empty
/// message, gets the everyday pick.
pub fn recommend(message: &str) -> ChatResponse {
    let q = message.to_lowercase();
    if AUDIO_KEYWORDS.iter().any(|k| q.contains(k)) {
        headphone_picks()
    } else {
        everyday_pick()
    }
}

pub fn trending() -> Vec<TrendItem> {
    [
        ("Ultra ANC Headphones", "Audio"),
        ("AI-ready Laptops", "Computers"),
        ("Smart Home Essentials", "Home"),
    ]
    .into_iter()
    .map(|(title, category)| TrendItem {
        title: title.to_string(),
        category: category.to_string(),
        product_id: None,
    })
    .collect()
}

fn retailer(name: &str, price: f64, url: &str, is_best: bool) -> RetailerOption {
    RetailerOption {
        name: name.to_string(),
        price,
        url: Some(url.to_string()),
        is_best,
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn headphone_picks() -> ChatResponse {
    let recommendations = vec![
        ProductCard {
            id: "p1".to_string(),
            title: "Sony WH-1000XM5".to_string(),
            price: 348.00,
            rating: 4.8,
            image: Some("https://images.unsplash.com/photo-1585386959984-a41552231665?q=80&w=1200&auto=format&fit=crop".to_string()),
            specs: strings(&["ANC", "30h battery", "Multipoint"]),
            retailers: vec![
                retailer("Amazon", 348.0, "https://amazon.com", true),
                retailer("BestBuy", 349.0, "https://bestbuy.com", false),
            ],
            why: Some("Best-in-class ANC with balanced tuning and comfort.".to_string()),
        },
        ProductCard {
            id: "p2".to_string(),
            title: "Bose QuietComfort Ultra".to_string(),
            price: 379.00,
            rating: 4.7,
            image: Some("https://images.unsplash.com/photo-1518444028785-8cdc4e4458f0?q=80&w=1200&auto=format&fit=crop".to_string()),
            specs: strings(&["Immersive Audio", "Great comfort", "Clear calls"]),
            retailers: vec![
                retailer("Bose", 379.0, "https://bose.com", false),
                retailer("Target", 369.0, "https://target.com", true),
            ],
            why: Some("Superb comfort, lush sound, strong ANC.".to_string()),
        },
    ];

    ChatResponse {
        summary: "I compared top noise-canceling headphones prioritizing comfort, ANC strength, and value. Here are your best picks.".to_string(),
        recommendations,
        tips: strings(&[
            "If you commute, prioritize ANC and comfort.",
            "Multipoint is useful if you switch between laptop and phone.",
            "Consider refurbished to save 15-25%.",
        ]),
    }
}

fn everyday_pick() -> ChatResponse {
    let recommendations = vec![ProductCard {
        id: "g1".to_string(),
        title: "Apple AirTag (4-pack)".to_string(),
        price: 79.00,
        rating: 4.9,
        image: Some("https://images.unsplash.com/photo-1617957743090-4f7fc5ad83b5?q=80&w=1200&auto=format&fit=crop".to_string()),
        specs: strings(&["Find My network", "Replaceable battery"]),
        retailers: vec![
            retailer("Apple", 99.0, "https://apple.com", false),
            retailer("Amazon", 79.0, "https://amazon.com", true),
        ],
        why: Some("Effortless tracking within Apple ecosystem.".to_string()),
    }];

    ChatResponse {
        summary: "Here\u{2019}s a smart everyday pick with excellent value and ecosystem benefits.".to_string(),
        recommendations,
        tips: strings(&["Bundle with a keyring holder."]),
    }
}
