//! Class-name metadata as written by Ultralytics exports.
//!
//! The ONNX export stores the id to name mapping as a YAML flow mapping,
//! e.g. `{0: 'acne', 1: "dark spot"}`, and the input size as `[640, 640]`.

use anyhow::Context;
use serde::Deserialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassNames {
    names: BTreeMap<usize, String>,
}

impl ClassNames {
    /// Parse the `names` entry, a YAML flow mapping of id to name.
    pub fn parse_ultralytics(raw: &str) -> anyhow::Result<Self> {
        let names: BTreeMap<usize, String> = serde_yaml::from_str(raw)
            .with_context(|| format!("class names are not an id to name mapping: {raw}"))?;

        Ok(Self { names })
    }

    /// Unknown ids resolve to their decimal form.
    pub fn resolve(&self, class_id: usize) -> String {
        self.names
            .get(&class_id)
            .cloned()
            .unwrap_or_else(|| class_id.to_string())
    }

    pub fn get(&self, class_id: usize) -> Option<&str> {
        self.names.get(&class_id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for ClassNames {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            names: iter.into_iter().map(Into::into).enumerate().collect(),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ImgSz {
    Square(u32),
    Sides(Vec<u32>),
}

/// Parse `imgsz` metadata (`[h, w]` or a single side) into (width, height).
pub fn parse_imgsz(raw: &str) -> Option<(u32, u32)> {
    match serde_yaml::from_str::<ImgSz>(raw).ok()? {
        ImgSz::Square(side) if side > 0 => Some((side, side)),
        ImgSz::Sides(sides) => match sides.as_slice() {
            [side] if *side > 0 => Some((*side, *side)),
            [h, w] if *h > 0 && *w > 0 => Some((*w, *h)),
            _ => None,
        },
        _ => None,
    }
}
