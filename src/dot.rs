//! Graphviz rendering.
//!
//! - terminals are squares at the bottom,
//! - decision nodes are grouped by variable, one rank per variable,
//! - high edges are solid, low edges dashed,
//! - complemented edges end in a hollow circle,
//! - roots are boxes at the top.
//!
//! ```
//! use bdd_randsolver::bdd::Bdd;
//!
//! let bdd = Bdd::default();
//! let f = bdd.apply_and(bdd.mk_var(1), bdd.mk_var(2));
//! let dot = bdd.to_dot(&[f]).unwrap();
//! assert!(dot.starts_with("graph {"));
//! ```

use std::collections::BTreeMap;
use std::fmt::Write as _;

use crate::bdd::Bdd;
use crate::reference::Ref;

#[derive(Debug, Clone)]
pub struct DotConfig {
    pub node_shape: &'static str,
    pub terminal_shape: &'static str,
    pub root_shape: &'static str,
    pub high_edge_style: &'static str,
    pub low_edge_style: &'static str,
}

impl Default for DotConfig {
    fn default() -> Self {
        Self {
            node_shape: "circle",
            terminal_shape: "square",
            root_shape: "rect",
            high_edge_style: "solid",
            low_edge_style: "dashed",
        }
    }
}

impl Bdd {
    /// Graph of every node reachable from `roots`, labelled `x{variable}`.
    pub fn to_dot(&self, roots: &[Ref]) -> Result<String, std::fmt::Error> {
        self.to_dot_with(roots, &DotConfig::default(), |v| format!("x{}", v))
    }

    /// Graph of every node reachable from `roots`, labelled by `label(variable)`.
    pub fn to_dot_with(
        &self,
        roots: &[Ref],
        config: &DotConfig,
        label: impl Fn(u32) -> String,
    ) -> Result<String, std::fmt::Error> {
        let target = |r: Ref| -> String {
            match (r.id(), r.is_negated()) {
                (0, false) => "one".to_string(),
                (0, true) => "zero".to_string(),
                (id, _) => format!("n{}", id),
            }
        };
        let arrow = |r: Ref| if r.is_negated() && r.id() != 0 { ", dir=forward, arrowhead=odot" } else { "" };

        let mut dot = String::new();
        writeln!(dot, "graph {{")?;
        writeln!(dot, "node [shape={}];", config.node_shape)?;

        writeln!(dot, "{{ rank=sink")?;
        writeln!(dot, "zero [shape={}, label=\"0\"];", config.terminal_shape)?;
        writeln!(dot, "one [shape={}, label=\"1\"];", config.terminal_shape)?;
        writeln!(dot, "}}")?;

        let mut nodes: Vec<u32> = self.descendants(roots.iter().copied()).into_iter().filter(|&id| id != 0).collect();
        nodes.sort_unstable();

        let mut ranks = BTreeMap::<u32, Vec<u32>>::new();
        for &id in &nodes {
            ranks.entry(self.variable(id)).or_default().push(id);
        }
        for (&v, ids) in &ranks {
            writeln!(dot, "{{ rank=same")?;
            for id in ids {
                writeln!(dot, "n{} [label={:?}];", id, label(v))?;
            }
            writeln!(dot, "}}")?;
        }

        for &id in &nodes {
            let high = self.high(id);
            let low = self.low(id);
            writeln!(dot, "n{} -- {} [style={}];", id, target(high), config.high_edge_style)?;
            writeln!(dot, "n{} -- {} [style={}{}];", id, target(low), config.low_edge_style, arrow(low))?;
        }

        writeln!(dot, "{{ rank=source")?;
        for (i, root) in roots.iter().enumerate() {
            writeln!(dot, "r{} [shape={}, label=\"{}\"];", i, config.root_shape, root)?;
        }
        writeln!(dot, "}}")?;
        for (i, &root) in roots.iter().enumerate() {
            if root.is_negated() && root.id() != 0 {
                writeln!(dot, "r{} -- {} [dir=forward, arrowhead=odot];", i, target(root))?;
            } else {
                writeln!(dot, "r{} -- {};", i, target(root))?;
            }
        }

        writeln!(dot, "}}")?;
        Ok(dot)
    }
}
