//! Core domain types for the specsync sidebar manifest.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// SidebarNode
// ---------------------------------------------------------------------------

/// One node of the navigation tree serialized to the sidebar manifest.
///
/// A node is exactly one of three shapes: a leaf link, a group with nested
/// items, or an autogenerated directory listing. The untagged representation
/// matches what the rendering layer consumes: the shape is implied by which
/// fields are present, never by a tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SidebarNode {
    /// A group with an explicit ordered list of child nodes.
    Group {
        label: String,
        items: Vec<SidebarNode>,
    },
    /// A label whose children are generated from an output directory.
    Autogenerate {
        label: String,
        autogenerate: AutogenerateDir,
    },
    /// A leaf entry pointing at a root-relative slug.
    Link { label: String, slug: String },
}

/// The directory reference inside an autogenerated sidebar node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutogenerateDir {
    pub directory: String,
}

impl SidebarNode {
    /// Display label, whichever shape the node is.
    pub fn label(&self) -> &str {
        match self {
            Self::Group { label, .. }
            | Self::Autogenerate { label, .. }
            | Self::Link { label, .. } => label,
        }
    }

    /// Collect every leaf slug in the subtree, depth-first.
    pub fn collect_slugs<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Self::Link { slug, .. } => out.push(slug),
            Self::Group { items, .. } => {
                for item in items {
                    item.collect_slugs(out);
                }
            }
            Self::Autogenerate { .. } => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sidebar_node_serialization() {
        let tree = vec![
            SidebarNode::Link {
                label: "Overview".into(),
                slug: "overview".into(),
            },
            SidebarNode::Group {
                label: "Specifications".into(),
                items: vec![SidebarNode::Link {
                    label: "Delegation".into(),
                    slug: "delegation".into(),
                }],
            },
            SidebarNode::Autogenerate {
                label: "Guides".into(),
                autogenerate: AutogenerateDir {
                    directory: "guides".into(),
                },
            },
        ];

        let json = serde_json::to_string_pretty(&tree).expect("serialize");
        assert!(json.contains("\"slug\": \"delegation\""));
        assert!(json.contains("\"directory\": \"guides\""));
        assert!(!json.contains("Link"), "untagged nodes carry no variant tag");

        let parsed: Vec<SidebarNode> = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(parsed, tree);
    }

    #[test]
    fn untagged_shapes_deserialize() {
        let json = r#"[
            {"label": "Spec", "slug": "spec"},
            {"label": "Section", "items": [{"label": "Child", "slug": "child"}]},
            {"label": "Auto", "autogenerate": {"directory": "auto"}}
        ]"#;
        let parsed: Vec<SidebarNode> = serde_json::from_str(json).expect("deserialize");
        assert!(matches!(parsed[0], SidebarNode::Link { .. }));
        assert!(matches!(parsed[1], SidebarNode::Group { .. }));
        assert!(matches!(parsed[2], SidebarNode::Autogenerate { .. }));
    }

    #[test]
    fn collect_slugs_walks_groups() {
        let tree = SidebarNode::Group {
            label: "Root".into(),
            items: vec![
                SidebarNode::Link {
                    label: "A".into(),
                    slug: "a".into(),
                },
                SidebarNode::Group {
                    label: "Nested".into(),
                    items: vec![SidebarNode::Link {
                        label: "B".into(),
                        slug: "b".into(),
                    }],
                },
                SidebarNode::Autogenerate {
                    label: "Auto".into(),
                    autogenerate: AutogenerateDir {
                        directory: "auto".into(),
                    },
                },
            ],
        };

        let mut slugs = Vec::new();
        tree.collect_slugs(&mut slugs);
        assert_eq!(slugs, vec!["a", "b"]);
    }

    #[test]
    fn sidebar_fixture_validates() {
        let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("../../../fixtures/json/sidebar.fixture.json");
        let fixture = std::fs::read_to_string(path).expect("read fixture");
        let parsed: Vec<SidebarNode> =
            serde_json::from_str(&fixture).expect("deserialize fixture sidebar");
        assert_eq!(parsed.len(), 3);
        assert_eq!(parsed[0].label(), "Introduction");
        let mut slugs = Vec::new();
        for node in &parsed {
            node.collect_slugs(&mut slugs);
        }
        assert!(slugs.contains(&"delegation"));
    }
}
