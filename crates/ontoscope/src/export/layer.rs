//! Z-ordered collection of exported SVG nodes.

use svg::node::element as svg_element;

pub type SvgNode = Box<dyn svg::Node>;

/// Export layers, bottom to top in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ExportLayer {
    Background,
    Links,
    Elements,
    /// Link labels stay readable above elements they cross.
    Labels,
}

impl ExportLayer {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Background => "background",
            Self::Links => "links",
            Self::Elements => "elements",
            Self::Labels => "labels",
        }
    }
}

/// SVG nodes tagged with the layer they render on.
#[derive(Debug, Default)]
pub struct LayeredOutput {
    items: Vec<(ExportLayer, SvgNode)>,
}

impl LayeredOutput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_to_layer(&mut self, layer: ExportLayer, node: SvgNode) {
        self.items.push((layer, node));
    }

    pub fn merge(&mut self, other: LayeredOutput) {
        self.items.extend(other.items);
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Groups the nodes into one `<g data-layer="...">` per non-empty layer.
    ///
    /// Nodes keep their insertion order within a layer.
    pub fn render(mut self) -> Vec<SvgNode> {
        self.items.sort_by_key(|(layer, _)| *layer);

        let mut groups: Vec<SvgNode> = Vec::new();
        let mut current: Option<(ExportLayer, svg_element::Group)> = None;
        for (layer, node) in self.items {
            current = match current {
                Some((current_layer, group)) if current_layer == layer => {
                    Some((layer, group.add(node)))
                }
                previous => {
                    if let Some((_, group)) = previous {
                        groups.push(Box::new(group));
                    }
                    let group = svg_element::Group::new()
                        .set("data-layer", layer.name())
                        .add(node);
                    Some((layer, group))
                }
            };
        }
        if let Some((_, group)) = current {
            groups.push(Box::new(group));
        }
        groups
    }
}
