use serde::Serialize;

/// Shared instructions prepended to every style fragment.
pub const BASE_TEMPLATE: &str = concat!(
    "Design a black and grey tattoo. The design should be clear and detailed, ",
    "with bold outlines and no shading gradients. Present the tattoo on a pure ",
    "white background (#FFFFFF), ensuring it's suitable as a stencil or template."
);

/// Identifier an unrecognised style falls back to.
pub const DEFAULT_STYLE_ID: &str = "Minimalist";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TattooStyle {
    Traditional,
    Realism,
    NeoTraditional,
    Japanese,
    Tribal,
    Minimalist,
}

impl TattooStyle {
    pub const ALL: [TattooStyle; 6] = [
        TattooStyle::Traditional,
        TattooStyle::Realism,
        TattooStyle::NeoTraditional,
        TattooStyle::Japanese,
        TattooStyle::Tribal,
        TattooStyle::Minimalist,
    ];

    /// Resolves a caller-supplied identifier. Never fails: anything that is not
    /// a known style becomes [`TattooStyle::Minimalist`].
    pub fn resolve(id: &str) -> Self {
        Self::parse(id).unwrap_or(TattooStyle::Minimalist)
    }

    pub fn parse(id: &str) -> Option<Self> {
        let normalized: String = id
            .trim()
            .chars()
            .filter(|c| !matches!(c, '-' | '_' | ' '))
            .flat_map(char::to_lowercase)
            .collect();
        match normalized.as_str() {
            "traditional" => Some(TattooStyle::Traditional),
            "realism" => Some(TattooStyle::Realism),
            "neotraditional" => Some(TattooStyle::NeoTraditional),
            "japanese" => Some(TattooStyle::Japanese),
            "tribal" => Some(TattooStyle::Tribal),
            "minimalist" => Some(TattooStyle::Minimalist),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TattooStyle::Traditional => "Traditional",
            TattooStyle::Realism => "Realism",
            TattooStyle::NeoTraditional => "Neo-Traditional",
            TattooStyle::Japanese => "Japanese",
            TattooStyle::Tribal => "Tribal",
            TattooStyle::Minimalist => DEFAULT_STYLE_ID,
        }
    }

    pub fn fragment(self) -> &'static str {
        match self {
            TattooStyle::Traditional => concat!(
                "Incorporate bold black outlines and a limited color palette, featuring iconic ",
                "motifs such as anchors, roses, or swallows. The design should reflect the classic ",
                "American traditional tattoo style, emphasizing simplicity and strong symbolism."
            ),
            TattooStyle::Realism => concat!(
                "Render the subject with lifelike detail, capturing intricate textures and depth ",
                "through precise shading. The design should closely resemble a high-resolution ",
                "black and grey photograph, emphasizing realism and accuracy."
            ),
            TattooStyle::NeoTraditional => concat!(
                "Blend traditional tattoo elements with modern artistic techniques, using bold ",
                "outlines combined with intricate details and a broader color palette. The design ",
                "should offer a contemporary twist on classic motifs, adding depth and dimension."
            ),
            TattooStyle::Japanese => concat!(
                "Incorporate traditional Japanese motifs such as koi fish, dragons, or cherry ",
                "blossoms, using bold outlines and vibrant colors. The design should reflect the ",
                "rich cultural heritage and storytelling aspects of Irezumi, emphasizing balance and flow."
            ),
            TattooStyle::Tribal => concat!(
                "Utilize bold black lines and repetitive geometric patterns inspired by indigenous ",
                "tribal art. The design should be abstract, focusing on symmetry and symbolic ",
                "meaning, reflecting traditional tribal tattoo aesthetics."
            ),
            TattooStyle::Minimalist => concat!(
                "Reduce the subject to its essential shapes using clean, single-weight linework and ",
                "generous negative space. The design should stay small-scale friendly, avoiding ",
                "ornamentation and keeping every line purposeful."
            ),
        }
    }

    pub fn prompt(self) -> String {
        format!("{BASE_TEMPLATE}\n\n{}", self.fragment())
    }
}

/// Builds the style-specific generation template for a raw identifier.
pub fn style_prompt(id: &str) -> String {
    TattooStyle::resolve(id).prompt()
}

#[derive(Debug, Serialize)]
pub struct StyleDescriptor {
    pub id: &'static str,
    pub prompt: &'static str,
    pub is_default: bool,
}

pub fn style_catalog() -> Vec<StyleDescriptor> {
    TattooStyle::ALL
        .iter()
        .map(|style| StyleDescriptor {
            id: style.label(),
            prompt: style.fragment(),
            is_default: style.label() == DEFAULT_STYLE_ID,
        })
        .collect()
}
