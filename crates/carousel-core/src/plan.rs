use crate::config::PlanConfig;
use crate::error::Result;
use crate::geometry::{EdgeGeometry, EdgeGeometryPlanner};
use crate::layout::{CircularLayout, NodeOrder};
use crate::model::{
    ArrowHead, DrawCommand, EdgeCommand, FontSpec, NodeCommand, Plan, Point, ViewExtent,
};
use crate::style::StyleResolver;
use crate::table::{State, WeightTable};

fn non_empty(label: Option<String>) -> Option<String> {
    label.filter(|s| !s.is_empty())
}

/// Lays out `table` on a circle and turns it into draw commands: one node command per state in
/// node order, then one edge command per drawn edge in edge-set order.
///
/// Every edge in the edge set must have a table entry, even edges that end up hidden; a missing
/// entry aborts the pass.
pub fn plan(table: &WeightTable, config: &PlanConfig) -> Result<Plan> {
    let label_format = config.validate()?;

    let order = match &config.node_set {
        Some(states) => NodeOrder::from_states(states.iter().cloned()),
        None => NodeOrder::from_table(table),
    };
    let edges: Vec<(State, State)> = match &config.edge_set {
        Some(edges) => edges.clone(),
        None => order.all_pairs(),
    };
    for (a, b) in &edges {
        order.require(a)?;
        order.require(b)?;
    }
    let weights = edges
        .iter()
        .map(|(a, b)| table.get(a, b))
        .collect::<Result<Vec<f64>>>()?;

    let layout = CircularLayout::new(order, config.rotation, config.radius);
    let styles =
        StyleResolver::new(table, config, &label_format).resolve_all(layout.order(), &edges)?;
    let planner = EdgeGeometryPlanner::new(&layout, &config.geometry);

    let mut commands = Vec::with_capacity(layout.len() + edges.len());

    let node_font = FontSpec {
        family: config.fonts.family.clone(),
        size: config.fonts.node_size,
    };
    for (index, state) in layout.order().states().iter().enumerate() {
        let angle = layout.angles()[index];
        let position = Point::polar(layout.radius(), angle);
        let label = non_empty(styles.node_labels[index].clone());
        commands.push(DrawCommand::Node(NodeCommand {
            state: state.clone(),
            index,
            angle,
            position,
            color: styles.node_colors[index].clone(),
            size: styles.node_sizes[index],
            marker_visible: label.is_none(),
            label,
            label_position: position,
            font: node_font.clone(),
        }));
    }

    let edge_font = FontSpec {
        family: config.fonts.family.clone(),
        size: config.fonts.edge_size,
    };
    let arrow = ArrowHead {
        length: config.geometry.head_length,
        width: config.geometry.head_width,
    };
    let mut hidden = 0usize;
    for (k, (source, target)) in edges.iter().enumerate() {
        let width = styles.edge_widths[k];
        if width == 0.0 {
            tracing::trace!(%source, %target, "skipping zero-width edge");
            hidden += 1;
            continue;
        }
        let geometry = planner.plan(source, target)?;
        if matches!(geometry, EdgeGeometry::Loop(_)) && !config.self_loops {
            tracing::trace!(%source, "skipping self-loop");
            hidden += 1;
            continue;
        }
        let color = styles.edge_colors[k].clone();
        commands.push(DrawCommand::Edge(EdgeCommand {
            source: source.clone(),
            target: target.clone(),
            weight: weights[k],
            label: non_empty(styles.edge_labels[k].clone()),
            label_position: geometry.label_anchor(),
            geometry,
            label_color: color.clone(),
            color,
            width,
            font: edge_font.clone(),
            arrow,
        }));
    }

    tracing::debug!(
        nodes = layout.len(),
        edges = edges.len(),
        hidden,
        radius = layout.radius(),
        "planned circular layout"
    );

    Ok(Plan {
        radius: layout.radius(),
        rotation: layout.rotation(),
        commands,
        extent: ViewExtent::symmetric(config.view_half_extent()),
    })
}
