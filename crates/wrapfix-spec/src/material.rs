//! Material graphs as a closed set of node kinds.
//!
//! A texture lookup is a chain of nodes linked through their UV inputs:
//!
//! ```text
//! UvMap -> [WrapMode | UvTransform]* -> ImageTexture
//! ```
//!
//! The condensation path replaces the `WrapMode` node feeding a texture with a
//! `UvTransform` into the atlas and switches the texture to clamp addressing.

use serde::{Deserialize, Serialize};

use crate::sampler::ImageRef;
use crate::transform::UvTransform;
use crate::wrap::{WrapMode, WrapPair};

/// Index of a node inside its graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub usize);

/// How an image texture node addresses coordinates outside [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Addressing {
    /// Whatever the upstream wrap node declares (repeat when there is none).
    #[default]
    Inherit,
    /// Clamp to edge on both axes.
    Clamp,
}

/// Capability: the node decides wrap behavior.
pub trait HasWrapMode {
    /// The wrap pair this node imposes, if any.
    fn wrap_mode(&self) -> Option<WrapPair>;
}

/// Capability: the node consumes UV coordinates from another node.
pub trait HasUvInput {
    fn uv_input(&self) -> Option<NodeId>;
    fn set_uv_input(&mut self, input: Option<NodeId>);
}

/// Texcoord set source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UvMapNode {
    /// Texcoord binding semantic.
    pub texcoord: String,
}

/// Affine remap of incoming coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UvTransformNode {
    pub transform: UvTransform,
    pub uv_input: Option<NodeId>,
}

/// Declared wrap behavior for the textures downstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WrapModeNode {
    pub wrap: WrapPair,
    pub uv_input: Option<NodeId>,
}

/// Image lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageTextureNode {
    pub image: ImageRef,
    /// `sampler2D` sid this lookup goes through, if any.
    pub sampler_sid: Option<String>,
    pub addressing: Addressing,
    pub uv_input: Option<NodeId>,
}

impl HasWrapMode for WrapModeNode {
    fn wrap_mode(&self) -> Option<WrapPair> {
        Some(self.wrap)
    }
}

impl HasWrapMode for ImageTextureNode {
    fn wrap_mode(&self) -> Option<WrapPair> {
        match self.addressing {
            Addressing::Clamp => Some(WrapPair::uniform(WrapMode::Clamp)),
            Addressing::Inherit => None,
        }
    }
}

macro_rules! impl_has_uv_input {
    ($($node:ty),*) => {
        $(impl HasUvInput for $node {
            fn uv_input(&self) -> Option<NodeId> {
                self.uv_input
            }

            fn set_uv_input(&mut self, input: Option<NodeId>) {
                self.uv_input = input;
            }
        })*
    };
}

impl_has_uv_input!(UvTransformNode, WrapModeNode, ImageTextureNode);

/// A material graph node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MaterialNode {
    UvMap(UvMapNode),
    UvTransform(UvTransformNode),
    WrapMode(WrapModeNode),
    ImageTexture(ImageTextureNode),
}

impl MaterialNode {
    /// Returns the node kind name.
    pub fn kind(&self) -> &'static str {
        match self {
            MaterialNode::UvMap(_) => "uv_map",
            MaterialNode::UvTransform(_) => "uv_transform",
            MaterialNode::WrapMode(_) => "wrap_mode",
            MaterialNode::ImageTexture(_) => "image_texture",
        }
    }

    /// Wrap capability, for nodes that have it.
    pub fn as_wrap_mode(&self) -> Option<&dyn HasWrapMode> {
        match self {
            MaterialNode::WrapMode(node) => Some(node),
            MaterialNode::ImageTexture(node) => Some(node),
            MaterialNode::UvMap(_) | MaterialNode::UvTransform(_) => None,
        }
    }

    /// UV input capability, for nodes that have it.
    pub fn as_uv_input(&self) -> Option<&dyn HasUvInput> {
        match self {
            MaterialNode::UvTransform(node) => Some(node),
            MaterialNode::WrapMode(node) => Some(node),
            MaterialNode::ImageTexture(node) => Some(node),
            MaterialNode::UvMap(_) => None,
        }
    }

    /// Mutable UV input capability.
    pub fn as_uv_input_mut(&mut self) -> Option<&mut dyn HasUvInput> {
        match self {
            MaterialNode::UvTransform(node) => Some(node),
            MaterialNode::WrapMode(node) => Some(node),
            MaterialNode::ImageTexture(node) => Some(node),
            MaterialNode::UvMap(_) => None,
        }
    }
}

/// The texture lookups of one material.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialGraph {
    pub material_id: String,
    pub material_name: String,
    nodes: Vec<MaterialNode>,
}

impl MaterialGraph {
    /// Creates an empty graph.
    pub fn new(material_id: impl Into<String>, material_name: impl Into<String>) -> Self {
        Self {
            material_id: material_id.into(),
            material_name: material_name.into(),
            nodes: Vec::new(),
        }
    }

    /// Adds a node and returns its id.
    pub fn add(&mut self, node: MaterialNode) -> NodeId {
        self.nodes.push(node);
        NodeId(self.nodes.len() - 1)
    }

    /// Adds a `UvMap -> WrapMode -> ImageTexture` chain and returns the texture node.
    pub fn add_texture_chain(
        &mut self,
        texcoord: impl Into<String>,
        wrap: WrapPair,
        image: ImageRef,
        sampler_sid: Option<String>,
    ) -> NodeId {
        let uv = self.add(MaterialNode::UvMap(UvMapNode {
            texcoord: texcoord.into(),
        }));
        let wrap = self.add(MaterialNode::WrapMode(WrapModeNode {
            wrap,
            uv_input: Some(uv),
        }));
        self.add(MaterialNode::ImageTexture(ImageTextureNode {
            image,
            sampler_sid,
            addressing: Addressing::Inherit,
            uv_input: Some(wrap),
        }))
    }

    /// Node by id.
    pub fn node(&self, id: NodeId) -> Option<&MaterialNode> {
        self.nodes.get(id.0)
    }

    /// All nodes in insertion order.
    pub fn nodes(&self) -> &[MaterialNode] {
        &self.nodes
    }

    /// Image texture nodes with their ids.
    pub fn image_textures(&self) -> impl Iterator<Item = (NodeId, &ImageTextureNode)> {
        self.nodes.iter().enumerate().filter_map(|(i, node)| match node {
            MaterialNode::ImageTexture(tex) => Some((NodeId(i), tex)),
            _ => None,
        })
    }

    /// Image texture node by id.
    pub fn image_texture(&self, id: NodeId) -> Option<&ImageTextureNode> {
        match self.node(id) {
            Some(MaterialNode::ImageTexture(tex)) => Some(tex),
            _ => None,
        }
    }

    /// Nodes feeding `id`, nearest first. Stops on a cycle.
    pub fn upstream(&self, id: NodeId) -> Vec<NodeId> {
        let mut chain = Vec::new();
        let mut current = self
            .node(id)
            .and_then(|n| n.as_uv_input())
            .and_then(|n| n.uv_input());
        while let Some(next) = current {
            if chain.contains(&next) || chain.len() > self.nodes.len() {
                break;
            }
            chain.push(next);
            current = self
                .node(next)
                .and_then(|n| n.as_uv_input())
                .and_then(|n| n.uv_input());
        }
        chain
    }

    /// Wrap pair the texture node effectively samples with.
    pub fn effective_wrap(&self, texture: NodeId) -> WrapPair {
        if let Some(own) = self
            .node(texture)
            .and_then(|n| n.as_wrap_mode())
            .and_then(|n| n.wrap_mode())
        {
            return own;
        }
        self.upstream(texture)
            .into_iter()
            .find_map(|id| {
                self.node(id)
                    .and_then(|n| n.as_wrap_mode())
                    .and_then(|n| n.wrap_mode())
            })
            .unwrap_or_default()
    }

    /// Combined UV transform applied upstream of the texture node.
    pub fn uv_transform(&self, texture: NodeId) -> UvTransform {
        // Coordinates flow from the far end of the chain toward the texture.
        self.upstream(texture)
            .into_iter()
            .rev()
            .filter_map(|id| match self.node(id) {
                Some(MaterialNode::UvTransform(node)) => Some(node.transform),
                _ => None,
            })
            .fold(UvTransform::IDENTITY, |acc, t| acc.then(&t))
    }

    /// Texcoord semantic at the root of the texture's chain.
    pub fn texcoord(&self, texture: NodeId) -> Option<&str> {
        self.upstream(texture)
            .into_iter()
            .find_map(|id| match self.node(id) {
                Some(MaterialNode::UvMap(node)) => Some(node.texcoord.as_str()),
                _ => None,
            })
    }

    /// Redirects a texture node into an atlas.
    ///
    /// The `WrapMode` node feeding the texture is replaced in place by a
    /// `UvTransform` node carrying `transform`; without one, a transform node is
    /// spliced in front of the texture. The texture switches to clamp addressing
    /// and samples `atlas`. Returns false if `texture` is not an image texture.
    pub fn condense_texture(
        &mut self,
        texture: NodeId,
        atlas: ImageRef,
        transform: UvTransform,
    ) -> bool {
        if self.image_texture(texture).is_none() {
            return false;
        }

        let wrap_node = self
            .upstream(texture)
            .into_iter()
            .find(|&id| matches!(self.node(id), Some(MaterialNode::WrapMode(_))));

        match wrap_node {
            Some(id) => {
                let uv_input = self.nodes[id.0].as_uv_input().and_then(|n| n.uv_input());
                self.nodes[id.0] = MaterialNode::UvTransform(UvTransformNode {
                    transform,
                    uv_input,
                });
            }
            None => {
                let uv_input = self.nodes[texture.0]
                    .as_uv_input()
                    .and_then(|n| n.uv_input());
                let inserted = self.add(MaterialNode::UvTransform(UvTransformNode {
                    transform,
                    uv_input,
                }));
                if let Some(node) = self.nodes[texture.0].as_uv_input_mut() {
                    node.set_uv_input(Some(inserted));
                }
            }
        }

        if let MaterialNode::ImageTexture(tex) = &mut self.nodes[texture.0] {
            tex.image = atlas;
            tex.addressing = Addressing::Clamp;
        }
        true
    }
}
