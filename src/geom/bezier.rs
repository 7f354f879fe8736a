//! Piecewise cubic bezier curves built from nodes with paired handles.
//!
//! A [`BezierCurve`] is an ordered list of [`BezierNode`]s. Each node stores
//! its position plus two handle offsets: `handle1` leads toward the next node
//! and `handle2` toward the previous one. Segment `i` is the cubic through
//! `node[i].position`, `node[i].position + node[i].handle1`,
//! `node[i + 1].position + node[i + 1].handle2` and `node[i + 1].position`.
//!
//! Closed curves repeat their first node as the last node, so a closed curve
//! with `n` distinct nodes stores `n + 1` nodes and has `n` segments.

use super::core::{Point3, Vec3};
use super::curve::{CubicBezier3, Curve3, curve_arc_length};
use super::tessellation::{CurvePoint, CurveTessellationOptions, TessellationDiagnostics, tessellate_bezier_curve};

/// Chord samples per segment used for arc-length estimates.
const LENGTH_SAMPLES_PER_SEGMENT: usize = 32;

/// How a node keeps its two handles related.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HandleStyle {
    /// `handle2 == -handle1` at all times.
    #[default]
    Auto,
    /// Handles point in opposite directions but keep their own lengths.
    Aligned,
    /// Handles are independent.
    Free,
    /// No handles; both are always zero.
    None,
}

#[derive(Debug, thiserror::Error, Clone, PartialEq)]
pub enum BezierError {
    #[error("bezier circle requires at least one point")]
    ZeroPointCount,
    #[error("bezier circle cannot hold {point_count} points")]
    TooManyPoints { point_count: usize },
    #[error("cannot interpolate curves with {left} and {right} nodes")]
    NodeCountMismatch { left: usize, right: usize },
    #[error("curve with {node_count} nodes cannot be tessellated")]
    DegenerateCurve { node_count: usize },
    #[error("bezier inputs must be finite")]
    NonFiniteInput,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BezierNode {
    position: Point3,
    handle1: Vec3,
    handle2: Vec3,
    handle_style: HandleStyle,
    relative_position: f64,
}

impl BezierNode {
    /// Creates a node and immediately enforces the style invariant, with
    /// `handle1` taking precedence over `handle2`.
    #[must_use]
    pub fn new(position: Point3, handle1: Vec3, handle2: Vec3, handle_style: HandleStyle) -> Self {
        let mut node = Self {
            position,
            handle1,
            handle2,
            handle_style,
            relative_position: 0.0,
        };
        node.enforce_style();
        node
    }

    /// Auto-style node with `handle2 = -handle1`.
    #[must_use]
    pub fn auto(position: Point3, handle1: Vec3) -> Self {
        Self::new(position, handle1, handle1.neg(), HandleStyle::Auto)
    }

    #[must_use]
    pub const fn position(&self) -> Point3 {
        self.position
    }

    #[must_use]
    pub const fn handle1(&self) -> Vec3 {
        self.handle1
    }

    #[must_use]
    pub const fn handle2(&self) -> Vec3 {
        self.handle2
    }

    #[must_use]
    pub const fn handle_style(&self) -> HandleStyle {
        self.handle_style
    }

    /// Arc-length fraction along the owning curve, valid after
    /// [`BezierCurve::process`].
    #[must_use]
    pub const fn relative_position(&self) -> f64 {
        self.relative_position
    }

    /// Absolute position of the outgoing control point.
    #[must_use]
    pub fn handle1_point(&self) -> Point3 {
        self.position.add_vec(self.handle1)
    }

    /// Absolute position of the incoming control point.
    #[must_use]
    pub fn handle2_point(&self) -> Point3 {
        self.position.add_vec(self.handle2)
    }

    pub fn set_position(&mut self, position: Point3) {
        self.position = position;
    }

    /// Sets `handle1`; depending on the style this also rewrites `handle2`.
    pub fn set_handle1(&mut self, handle: Vec3) {
        match self.handle_style {
            HandleStyle::Auto => {
                self.handle1 = handle;
                self.handle2 = handle.neg();
            }
            HandleStyle::Aligned => {
                self.handle1 = handle;
                self.handle2 = aligned_opposite(handle, self.handle2);
            }
            HandleStyle::Free => self.handle1 = handle,
            HandleStyle::None => {}
        }
    }

    /// Sets `handle2`; depending on the style this also rewrites `handle1`.
    pub fn set_handle2(&mut self, handle: Vec3) {
        match self.handle_style {
            HandleStyle::Auto => {
                self.handle2 = handle;
                self.handle1 = handle.neg();
            }
            HandleStyle::Aligned => {
                self.handle2 = handle;
                self.handle1 = aligned_opposite(handle, self.handle1);
            }
            HandleStyle::Free => self.handle2 = handle,
            HandleStyle::None => {}
        }
    }

    pub fn set_handle_style(&mut self, style: HandleStyle) {
        self.handle_style = style;
        self.enforce_style();
    }

    /// Scales position and both handles about the curve origin.
    pub fn scale(&mut self, factor: f64) {
        self.position = self.position.scaled(factor);
        self.handle1 = self.handle1.mul_scalar(factor);
        self.handle2 = self.handle2.mul_scalar(factor);
    }

    /// Node-wise interpolation. The style is taken from `self`.
    #[must_use]
    pub fn lerp(&self, other: &Self, t: f64) -> Self {
        Self {
            position: self.position.lerp(other.position, t),
            handle1: self.handle1.lerp(other.handle1, t),
            handle2: self.handle2.lerp(other.handle2, t),
            handle_style: self.handle_style,
            relative_position: self.relative_position
                + (other.relative_position - self.relative_position) * t,
        }
    }

    fn enforce_style(&mut self) {
        match self.handle_style {
            HandleStyle::Auto => self.handle2 = self.handle1.neg(),
            HandleStyle::Aligned => self.handle2 = aligned_opposite(self.handle1, self.handle2),
            HandleStyle::Free => {}
            HandleStyle::None => {
                self.handle1 = Vec3::ZERO;
                self.handle2 = Vec3::ZERO;
            }
        }
    }
}

/// Points `other` opposite to `master`, keeping the length of `other`.
fn aligned_opposite(master: Vec3, other: Vec3) -> Vec3 {
    match master.normalized() {
        Some(dir) => dir.neg().mul_scalar(other.length()),
        None => other,
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct BezierCurve {
    nodes: Vec<BezierNode>,
    closed: bool,
}

impl BezierCurve {
    #[must_use]
    pub const fn new(closed: bool) -> Self {
        Self {
            nodes: Vec::new(),
            closed,
        }
    }

    #[must_use]
    pub fn from_nodes(nodes: Vec<BezierNode>, closed: bool) -> Self {
        Self { nodes, closed }
    }

    #[must_use]
    pub fn nodes(&self) -> &[BezierNode] {
        &self.nodes
    }

    #[must_use]
    pub fn node(&self, index: usize) -> Option<&BezierNode> {
        self.nodes.get(index)
    }

    pub fn node_mut(&mut self, index: usize) -> Option<&mut BezierNode> {
        self.nodes.get_mut(index)
    }

    pub fn nodes_mut(&mut self) -> impl Iterator<Item = &mut BezierNode> {
        self.nodes.iter_mut()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[must_use]
    pub const fn closed(&self) -> bool {
        self.closed
    }

    pub fn push_node(&mut self, node: BezierNode) {
        self.nodes.push(node);
    }

    /// Inserts a node, clamping the index to the end of the list.
    pub fn insert_node(&mut self, index: usize, node: BezierNode) {
        let index = index.min(self.nodes.len());
        self.nodes.insert(index, node);
    }

    pub fn remove_node(&mut self, index: usize) -> Option<BezierNode> {
        (index < self.nodes.len()).then(|| self.nodes.remove(index))
    }

    /// Copies the first node over the last one on closed curves.
    pub fn sync_closure(&mut self) {
        if !self.closed || self.nodes.len() < 2 {
            return;
        }
        let first = self.nodes[0].clone();
        if let Some(last) = self.nodes.last_mut() {
            *last = first;
        }
    }

    #[must_use]
    pub fn segment_count(&self) -> usize {
        self.nodes.len().saturating_sub(1)
    }

    #[must_use]
    pub fn segment(&self, index: usize) -> Option<CubicBezier3> {
        let a = self.nodes.get(index)?;
        let b = self.nodes.get(index + 1)?;
        Some(CubicBezier3::new(
            a.position,
            a.handle1_point(),
            b.handle2_point(),
            b.position,
        ))
    }

    pub fn segments(&self) -> impl Iterator<Item = CubicBezier3> + '_ {
        (0..self.segment_count()).filter_map(move |i| self.segment(i))
    }

    /// Scales every node about the curve origin.
    pub fn scale(&mut self, factor: f64) {
        for node in &mut self.nodes {
            node.scale(factor);
        }
    }

    /// Node-wise interpolation between two curves with the same node count.
    ///
    /// `t <= 0` returns `a` and `t >= 1` returns `b` unchanged.
    pub fn lerp(a: &Self, b: &Self, t: f64) -> Result<Self, BezierError> {
        if a.nodes.len() != b.nodes.len() {
            return Err(BezierError::NodeCountMismatch {
                left: a.nodes.len(),
                right: b.nodes.len(),
            });
        }
        if !t.is_finite() {
            return Err(BezierError::NonFiniteInput);
        }
        if t <= 0.0 {
            return Ok(a.clone());
        }
        if t >= 1.0 {
            return Ok(b.clone());
        }

        let nodes = a
            .nodes
            .iter()
            .zip(&b.nodes)
            .map(|(na, nb)| na.lerp(nb, t))
            .collect();
        Ok(Self {
            nodes,
            closed: a.closed,
        })
    }

    /// Approximate arc length of the whole curve.
    #[must_use]
    pub fn length(&self) -> f64 {
        self.segments()
            .map(|segment| curve_arc_length(&segment, LENGTH_SAMPLES_PER_SEGMENT))
            .sum()
    }

    /// Recomputes every node's relative position from segment arc lengths.
    pub fn process(&mut self) {
        let lengths: Vec<f64> = self
            .segments()
            .map(|segment| curve_arc_length(&segment, LENGTH_SAMPLES_PER_SEGMENT))
            .collect();
        let total: f64 = lengths.iter().sum();

        let mut accumulated = 0.0;
        for (index, node) in self.nodes.iter_mut().enumerate() {
            node.relative_position = if total > 0.0 && total.is_finite() {
                accumulated / total
            } else {
                0.0
            };
            if let Some(length) = lengths.get(index) {
                accumulated += length;
            }
        }
    }

    /// Samples the curve so that the direction turns by at most the
    /// configured angle tolerance between consecutive points.
    pub fn tessellate(
        &self,
        options: CurveTessellationOptions,
    ) -> Result<(Vec<CurvePoint>, TessellationDiagnostics), BezierError> {
        tessellate_bezier_curve(self, options)
    }
}

impl Curve3 for BezierCurve {
    /// Uniform in segment index: segment `i` covers `[i/n, (i+1)/n]`.
    fn point_at(&self, t: f64) -> Point3 {
        let count = self.segment_count();
        if count == 0 {
            return self.nodes.first().map_or(Point3::ORIGIN, BezierNode::position);
        }

        let scaled = t.clamp(0.0, 1.0) * count as f64;
        let index = (scaled.floor() as usize).min(count - 1);
        self.segment(index)
            .map_or(Point3::ORIGIN, |segment| segment.point_at(scaled - index as f64))
    }

    fn is_closed(&self) -> bool {
        self.closed
    }
}
