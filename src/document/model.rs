//! In-memory form of a scene document and the asset-path slots it exposes.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::models::{ReferenceKind, ReferenceSite, SiteLocator, SiteRewrites};

/// A layer of scene description.
///
/// Only the fields that can hold asset paths are modelled; everything else a document
/// carries is preserved verbatim in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct SceneDocument {
    /// Layers composed beneath this one, strongest first.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sublayers: Vec<String>,
    /// Asset-valued layer metadata.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, String>,
    /// Prims authored in this layer.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub prims: Vec<Prim>,
    /// Fields without asset paths.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// A prim and the composition arcs and properties authored on it.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Prim {
    /// Scene path of the prim.
    pub path: String,
    /// Referenced layers.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub references: Vec<String>,
    /// Payload layers.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub payloads: Vec<String>,
    /// Value clips driving the prim over time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clips: Option<ClipSet>,
    /// Asset-valued prim metadata.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, String>,
    /// Asset-valued properties.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub properties: Vec<Property>,
    /// Fields without asset paths.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// Clip layers, listed explicitly or named by a numbered template.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct ClipSet {
    /// Explicit clip layers.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub asset_paths: Vec<String>,
    /// Template such as `clips/anim.###.json`, one `#` per digit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
    /// Fields without asset paths.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// An asset-valued property.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Property {
    /// Property name.
    pub name: String,
    /// Default value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    /// Values keyed by time code.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub time_samples: BTreeMap<String, String>,
    /// Asset-valued property metadata.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, String>,
}

impl SceneDocument {
    /// Every non-empty asset-path slot of the document, in authored order.
    pub fn reference_sites(&self) -> Vec<ReferenceSite> {
        let mut sites = Vec::new();
        let mut push = |kind, asset_path: &str, locator| {
            if asset_path.trim().is_empty() {
                return;
            }
            sites.push(ReferenceSite {
                kind,
                asset_path: asset_path.to_string(),
                locator,
            });
        };

        for (index, path) in self.sublayers.iter().enumerate() {
            push(ReferenceKind::Sublayer, path, SiteLocator::Sublayer(index));
        }
        for (key, path) in &self.metadata {
            push(
                ReferenceKind::Metadata,
                path,
                SiteLocator::LayerMetadata(key.clone()),
            );
        }

        for (p, prim) in self.prims.iter().enumerate() {
            for (index, path) in prim.references.iter().enumerate() {
                push(
                    ReferenceKind::Reference,
                    path,
                    SiteLocator::Reference { prim: p, index },
                );
            }
            for (index, path) in prim.payloads.iter().enumerate() {
                push(
                    ReferenceKind::Payload,
                    path,
                    SiteLocator::Payload { prim: p, index },
                );
            }
            if let Some(clips) = &prim.clips {
                for (index, path) in clips.asset_paths.iter().enumerate() {
                    push(
                        ReferenceKind::Clip,
                        path,
                        SiteLocator::ClipAsset { prim: p, index },
                    );
                }
                if let Some(template) = &clips.template {
                    push(
                        ReferenceKind::ClipTemplate,
                        template,
                        SiteLocator::ClipTemplate { prim: p },
                    );
                }
            }
            for (key, path) in &prim.metadata {
                push(
                    ReferenceKind::Metadata,
                    path,
                    SiteLocator::PrimMetadata {
                        prim: p,
                        key: key.clone(),
                    },
                );
            }
            for (property_index, property) in prim.properties.iter().enumerate() {
                if let Some(path) = &property.default {
                    push(
                        ReferenceKind::PropertyValue,
                        path,
                        SiteLocator::PropertyDefault {
                            prim: p,
                            property: property_index,
                        },
                    );
                }
                for (time, path) in &property.time_samples {
                    push(
                        ReferenceKind::TimeSample,
                        path,
                        SiteLocator::TimeSample {
                            prim: p,
                            property: property_index,
                            time: time.clone(),
                        },
                    );
                }
                for (key, path) in &property.metadata {
                    push(
                        ReferenceKind::Metadata,
                        path,
                        SiteLocator::PropertyMetadata {
                            prim: p,
                            property: property_index,
                            key: key.clone(),
                        },
                    );
                }
            }
        }

        sites
    }

    /// Copy of the document with `rewrites` applied; removed sites disappear entirely.
    pub fn rewrite(&self, rewrites: &SiteRewrites) -> SceneDocument {
        let sublayers = self
            .sublayers
            .iter()
            .enumerate()
            .filter_map(|(index, path)| apply(rewrites, SiteLocator::Sublayer(index), path))
            .collect();
        let metadata = rewrite_map(&self.metadata, |key| {
            SiteLocator::LayerMetadata(key.to_string())
        }, rewrites);
        let prims = self
            .prims
            .iter()
            .enumerate()
            .map(|(index, prim)| prim.rewrite(index, rewrites))
            .collect();

        SceneDocument {
            sublayers,
            metadata,
            prims,
            extra: self.extra.clone(),
        }
    }
}

impl Prim {
    fn rewrite(&self, prim: usize, rewrites: &SiteRewrites) -> Prim {
        let references = self
            .references
            .iter()
            .enumerate()
            .filter_map(|(index, path)| {
                apply(rewrites, SiteLocator::Reference { prim, index }, path)
            })
            .collect();
        let payloads = self
            .payloads
            .iter()
            .enumerate()
            .filter_map(|(index, path)| apply(rewrites, SiteLocator::Payload { prim, index }, path))
            .collect();

        let clips = self.clips.as_ref().and_then(|clips| {
            let asset_paths: Vec<String> = clips
                .asset_paths
                .iter()
                .enumerate()
                .filter_map(|(index, path)| {
                    apply(rewrites, SiteLocator::ClipAsset { prim, index }, path)
                })
                .collect();
            let template = clips
                .template
                .as_deref()
                .and_then(|path| apply(rewrites, SiteLocator::ClipTemplate { prim }, path));
            if asset_paths.is_empty() && template.is_none() {
                return None;
            }
            Some(ClipSet {
                asset_paths,
                template,
                extra: clips.extra.clone(),
            })
        });

        let metadata = rewrite_map(&self.metadata, |key| SiteLocator::PrimMetadata {
            prim,
            key: key.to_string(),
        }, rewrites);

        let properties = self
            .properties
            .iter()
            .enumerate()
            .map(|(property, value)| Property {
                name: value.name.clone(),
                default: value.default.as_deref().and_then(|path| {
                    apply(rewrites, SiteLocator::PropertyDefault { prim, property }, path)
                }),
                time_samples: rewrite_map(&value.time_samples, |time| SiteLocator::TimeSample {
                    prim,
                    property,
                    time: time.to_string(),
                }, rewrites),
                metadata: rewrite_map(&value.metadata, |key| SiteLocator::PropertyMetadata {
                    prim,
                    property,
                    key: key.to_string(),
                }, rewrites),
            })
            .collect();

        Prim {
            path: self.path.clone(),
            references,
            payloads,
            clips,
            metadata,
            properties,
            extra: self.extra.clone(),
        }
    }
}

fn apply(rewrites: &SiteRewrites, locator: SiteLocator, current: &str) -> Option<String> {
    match rewrites.get(&locator) {
        Some(replacement) => replacement.clone(),
        None => Some(current.to_string()),
    }
}

fn rewrite_map(
    values: &BTreeMap<String, String>,
    locator: impl Fn(&str) -> SiteLocator,
    rewrites: &SiteRewrites,
) -> BTreeMap<String, String> {
    values
        .iter()
        .filter_map(|(key, path)| {
            apply(rewrites, locator(key), path).map(|path| (key.clone(), path))
        })
        .collect()
}
