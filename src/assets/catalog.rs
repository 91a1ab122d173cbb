use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::foundation::core::{Canvas, PlacementRect, Rgb8};
use crate::foundation::error::{DrapeError, DrapeResult};

/// Garment family a product belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductCategory {
    /// T-shirts.
    Tshirt,
    /// Hooded sweatshirts.
    Hoodie,
    /// Crew-neck sweatshirts.
    Sweatshirt,
}

/// Everything the compositor needs to know about a product for one session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProductDescriptor {
    /// Stable product identifier.
    pub id: String,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Garment family.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<ProductCategory>,
    /// Reference to the base product photo (catalog-relative path).
    pub image: String,
    /// Intrinsic canvas size the product is composed at.
    #[serde(default)]
    pub canvas: Canvas,
    /// Where uploaded designs are placed initially.
    pub placement: PlacementRect,
    /// Tint colors offered for this product; the first one is the default.
    #[serde(default)]
    pub colors: Vec<Rgb8>,
}

impl ProductDescriptor {
    /// Minimal descriptor with no name, category or color list.
    pub fn new(
        id: impl Into<String>,
        image: impl Into<String>,
        canvas: Canvas,
        placement: PlacementRect,
    ) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            category: None,
            image: image.into(),
            canvas,
            placement,
            colors: Vec::new(),
        }
    }

    /// Validate identifier, canvas and placement.
    pub fn validate(&self) -> DrapeResult<()> {
        if self.id.trim().is_empty() {
            return Err(DrapeError::validation("product id must be non-empty"));
        }
        self.canvas.validate()?;
        self.placement.validate()
    }

    /// First offered color, or white when the product lists none.
    pub fn default_color(&self) -> Rgb8 {
        self.colors.first().copied().unwrap_or(Rgb8::WHITE)
    }
}

/// JSON product catalog.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    /// Products in display order.
    pub products: Vec<ProductDescriptor>,
}

impl Catalog {
    /// Parse and validate a catalog from a JSON reader.
    pub fn from_reader<R: std::io::Read>(r: R) -> DrapeResult<Self> {
        let catalog: Catalog = serde_json::from_reader(r)
            .map_err(|e| DrapeError::serde(format!("parse catalog JSON: {e}")))?;
        catalog.validate()?;
        Ok(catalog)
    }

    /// Parse and validate a catalog from a JSON file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> DrapeResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            DrapeError::validation(format!("open catalog JSON '{}': {e}", path.display()))
        })?;
        Self::from_reader(BufReader::new(f))
    }

    /// Check every product and reject duplicate ids or unsafe image paths.
    pub fn validate(&self) -> DrapeResult<()> {
        let mut seen = std::collections::HashSet::new();
        for p in &self.products {
            p.validate()?;
            normalize_rel_path(&p.image)?;
            if !seen.insert(p.id.as_str()) {
                return Err(DrapeError::validation(format!(
                    "duplicate product id '{}'",
                    p.id
                )));
            }
        }
        Ok(())
    }

    /// Look a product up by id.
    pub fn get(&self, id: &str) -> Option<&ProductDescriptor> {
        self.products.iter().find(|p| p.id == id)
    }

    /// Products of one category, in catalog order.
    pub fn by_category(
        &self,
        category: ProductCategory,
    ) -> impl Iterator<Item = &ProductDescriptor> {
        self.products
            .iter()
            .filter(move |p| p.category == Some(category))
    }

    /// Resolve a product image path against the directory holding the catalog.
    pub fn image_path(root: &Path, product: &ProductDescriptor) -> DrapeResult<PathBuf> {
        Ok(root.join(normalize_rel_path(&product.image)?))
    }
}

/// Normalize a catalog-relative path: forward slashes, no `.`/empty segments, no `..`, not
/// absolute.
pub fn normalize_rel_path(source: &str) -> DrapeResult<String> {
    let s = source.replace('\\', "/");
    if s.starts_with('/') {
        return Err(DrapeError::validation("image paths must be relative"));
    }
    if s.is_empty() {
        return Err(DrapeError::validation("image path must be non-empty"));
    }

    let mut out = Vec::<&str>::new();
    for part in s.split('/') {
        if part.is_empty() || part == "." {
            continue;
        }
        if part == ".." {
            return Err(DrapeError::validation("image paths must not contain '..'"));
        }
        out.push(part);
    }

    if out.is_empty() {
        return Err(DrapeError::validation("image path must contain a file name"));
    }

    Ok(out.join("/"))
}

#[cfg(test)]
#[path = "../../tests/unit/assets/catalog.rs"]
mod tests;
