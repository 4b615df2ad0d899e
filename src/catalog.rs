/// Read-only exercise catalog
///
/// The catalog is a pre-built JSON document of categories. A category is
/// either flat (its own video list) or hierarchical (sub-categories, each
/// with a video list).
use crate::error::{PlayerError, Result};
use crate::video::VideoDescriptor;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Catalog {
    pub categories: Vec<Category>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CategoryKind {
    Flat,
    Hierarchical,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: String,
    pub label: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub kind: CategoryKind,
    #[serde(default)]
    pub videos: Vec<VideoDescriptor>,
    #[serde(default)]
    pub sub_categories: Vec<SubCategory>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubCategory {
    pub id: String,
    pub label: String,
    #[serde(default)]
    pub videos: Vec<VideoDescriptor>,
}

impl Catalog {
    /// Load the catalog from a JSON file
    pub async fn load(path: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path).await?;
        let catalog = Self::from_json(&content)?;
        info!(
            "📚 Loaded catalog with {} categories from {}",
            catalog.categories.len(),
            path.display()
        );
        Ok(catalog)
    }

    pub fn from_json(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn category(&self, id: &str) -> Option<&Category> {
        self.categories.iter().find(|category| category.id == id)
    }

    /// Total number of videos across every category
    pub fn video_count(&self) -> usize {
        self.categories
            .iter()
            .map(|category| {
                category.videos.len()
                    + category
                        .sub_categories
                        .iter()
                        .map(|sub| sub.videos.len())
                        .sum::<usize>()
            })
            .sum()
    }
}

impl Category {
    pub fn sub_category(&self, id: &str) -> Option<&SubCategory> {
        self.sub_categories.iter().find(|sub| sub.id == id)
    }

    /// The listing a single-mode session navigates through.
    ///
    /// Flat categories list their own videos; hierarchical ones require a
    /// sub-category.
    pub fn listing(&self, sub_category: Option<&str>) -> Result<&[VideoDescriptor]> {
        match (self.kind, sub_category) {
            (CategoryKind::Flat, _) => Ok(&self.videos),
            (CategoryKind::Hierarchical, Some(sub_id)) => self
                .sub_category(sub_id)
                .map(|sub| sub.videos.as_slice())
                .ok_or_else(|| {
                    PlayerError::Catalog(format!(
                        "Sub-category {} not found in {}",
                        sub_id, self.id
                    ))
                }),
            (CategoryKind::Hierarchical, None) => Err(PlayerError::Catalog(format!(
                "Category {} is hierarchical, pick a sub-category",
                self.id
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "categories": [
            {
                "id": "legs",
                "label": "Legs",
                "type": "flat",
                "videos": [
                    { "url": "https://www.youtube.com/shorts/squat123", "title": "Squat" },
                    { "url": "https://www.youtube.com/shorts/lunge123", "title": "Lunge", "endOffset": 5 }
                ]
            },
            {
                "id": "core",
                "label": "Core",
                "description": "Abs and obliques",
                "type": "hierarchical",
                "subCategories": [
                    { "id": "planks", "label": "Planks", "videos": [
                        { "url": "https://www.youtube.com/shorts/plank1234", "title": "Plank" }
                    ] }
                ]
            }
        ]
    }"#;

    #[test]
    fn test_parse_catalog() {
        let catalog = Catalog::from_json(SAMPLE).unwrap();
        assert_eq!(catalog.categories.len(), 2);
        assert_eq!(catalog.video_count(), 3);

        let core = catalog.category("core").unwrap();
        assert_eq!(core.kind, CategoryKind::Hierarchical);
        assert_eq!(core.description.as_deref(), Some("Abs and obliques"));
    }

    #[test]
    fn test_listing_for_flat_and_hierarchical() {
        let catalog = Catalog::from_json(SAMPLE).unwrap();

        let legs = catalog.category("legs").unwrap();
        assert_eq!(legs.listing(None).unwrap().len(), 2);

        let core = catalog.category("core").unwrap();
        assert!(core.listing(None).is_err());
        assert!(core.listing(Some("missing")).is_err());
        assert_eq!(core.listing(Some("planks")).unwrap()[0].title, "Plank");
    }
}
