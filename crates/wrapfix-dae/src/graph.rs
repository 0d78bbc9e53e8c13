//! Material graphs built from extracted samplers.

use wrapfix_spec::{Addressing, ImageRef, MaterialGraph, NodeId, TextureSamplerRef, UvTransform};

/// One [`MaterialGraph`] per material, with the texture node of every sampler.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MaterialGraphSet {
    graphs: Vec<MaterialGraph>,
    /// `(graph index, texture node)` parallel to the sampler slice.
    sites: Vec<(usize, NodeId)>,
}

impl MaterialGraphSet {
    /// Builds a `UvMap -> WrapMode -> ImageTexture` chain per sampler.
    pub fn build(samplers: &[TextureSamplerRef]) -> Self {
        let mut set = Self::default();
        for sampler in samplers {
            let index = match set
                .graphs
                .iter()
                .position(|g| g.material_id == sampler.material_id)
            {
                Some(index) => index,
                None => {
                    set.graphs.push(MaterialGraph::new(
                        sampler.material_id.clone(),
                        sampler.material_name.clone(),
                    ));
                    set.graphs.len() - 1
                }
            };
            let node = set.graphs[index].add_texture_chain(
                sampler.texcoord.clone(),
                sampler.wrap,
                sampler.image.clone(),
                sampler.sampler_sid.clone(),
            );
            set.sites.push((index, node));
        }
        set
    }

    pub fn graphs(&self) -> &[MaterialGraph] {
        &self.graphs
    }

    /// Graph and texture node of the sampler at `index`.
    pub fn locate(&self, index: usize) -> Option<(&MaterialGraph, NodeId)> {
        let &(graph, node) = self.sites.get(index)?;
        Some((&self.graphs[graph], node))
    }

    /// Redirects the sampler at `index` into an atlas.
    pub fn condense(&mut self, index: usize, atlas: ImageRef, transform: UvTransform) -> bool {
        match self.sites.get(index) {
            Some(&(graph, node)) => self.graphs[graph].condense_texture(node, atlas, transform),
            None => false,
        }
    }

    /// Returns true if the sampler at `index` now samples an atlas.
    pub fn is_condensed(&self, index: usize) -> bool {
        self.locate(index)
            .and_then(|(graph, node)| graph.image_texture(node))
            .is_some_and(|tex| tex.addressing == Addressing::Clamp)
    }

    /// Number of texture nodes redirected into atlases.
    pub fn condensed_count(&self) -> usize {
        (0..self.sites.len()).filter(|&i| self.is_condensed(i)).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wrapfix_spec::{WrapMode, WrapPair};

    fn samplers() -> Vec<TextureSamplerRef> {
        let tile = ImageRef::new("tile", "tile.png");
        vec![
            TextureSamplerRef::new("Floor", tile.clone(), WrapPair::uniform(WrapMode::Mirror))
                .with_texcoord("CHANNEL0"),
            TextureSamplerRef::new("Wall", tile.clone(), WrapPair::uniform(WrapMode::Repeat)),
            TextureSamplerRef::new("Floor", ImageRef::new("dirt", "dirt.png"), WrapPair::default())
                .with_texcoord("CHANNEL1"),
        ]
    }

    #[test]
    fn test_one_graph_per_material() {
        let set = MaterialGraphSet::build(&samplers());
        assert_eq!(set.graphs().len(), 2);

        let (floor, dirt) = set.locate(2).unwrap();
        assert_eq!(floor.material_id, "Floor");
        assert_eq!(floor.texcoord(dirt), Some("CHANNEL1"));
        assert_eq!(
            floor.effective_wrap(set.locate(0).unwrap().1),
            WrapPair::uniform(WrapMode::Mirror)
        );
        assert!(set.locate(3).is_none());
    }

    #[test]
    fn test_condense_redirects_one_site() {
        let mut set = MaterialGraphSet::build(&samplers());
        let transform = UvTransform::new([0.0, 0.0], [0.5, 1.0]);
        assert!(set.condense(0, ImageRef::new("tile_condensed", "tile_condensed.png"), transform));
        assert!(!set.condense(9, ImageRef::new("x", "x.png"), transform));

        assert!(set.is_condensed(0));
        assert!(!set.is_condensed(2));
        assert_eq!(set.condensed_count(), 1);

        let (graph, node) = set.locate(0).unwrap();
        assert_eq!(graph.uv_transform(node), transform);
        assert_eq!(graph.image_texture(node).unwrap().image.id, "tile_condensed");
        assert_eq!(graph.texcoord(node), Some("CHANNEL0"));
    }
}
