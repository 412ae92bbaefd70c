//! The rendering state machine.
//!
//! [`Graph`] consumes nodes in topological order and converts each one into
//! a short run of fixed-width ASCII rows: expansion rows that open space
//! around a wide merge, the principal row marked `*`, the fan-out row after
//! a merge, and collapsing rows that migrate branch lines back to the left
//! until the column layout is minimal again. Column identity persists
//! across rows through the commit each column tracks, so glyphs line up
//! from one row to the next.

use std::fmt::{self, Debug};
use std::io::Write;
use std::mem;

use thiserror::Error;
use tracing::instrument;

use crate::color::COLUMN_COLORS_ANSI;
use crate::node::{Dag, NodeId};
use crate::sequence::{toposort, unique, walk};

/// The error type for rendering operations.
#[derive(Debug, Error)]
pub enum Error {
    /// The output sink failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Options controlling how the graph is drawn.
#[derive(Clone, Debug)]
pub struct GraphOptions {
    /// Treat each node as having at most its first parent. All other
    /// parents, and lineages reachable only through them, are hidden.
    pub first_parent_only: bool,

    /// Wrap each branch-line glyph in its column's escape sequence. When
    /// disabled, columns carry no color at all.
    pub use_color: bool,

    /// The palette: one opaque escape sequence per color, with the reset
    /// sequence in the final position. `None` selects
    /// [`COLUMN_COLORS_ANSI`]. Must be non-empty if supplied.
    pub column_colors: Option<Vec<String>>,
}

impl Default for GraphOptions {
    fn default() -> Self {
        GraphOptions {
            first_parent_only: false,
            use_color: true,
            column_colors: None,
        }
    }
}

/// What kind of row [`Graph`] will emit next. `Padding` is the quiescent
/// state between nodes; every node's output ends back at `Padding`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum GraphState {
    Padding,
    Skip,
    PreCommit,
    Commit,
    PostMerge,
    Collapsing,
}

/// A single column of output: the lineage it is tracking and the palette
/// index to draw it with.
///
/// Columns are positional slots rebuilt on every update; only the tracked
/// commit is stable across rows.
#[derive(Clone, Copy, Debug)]
struct Column {
    commit: NodeId,
    color: Option<usize>,
}

/// A state machine that renders DAG nodes into an ASCII diagram.
///
/// One instance serves one rendering: it borrows the node arena and owns
/// the sink for its lifetime.
///
/// ```
/// use asciidag::graph::{Graph, GraphOptions};
/// use asciidag::node::Dag;
///
/// let mut dag = Dag::new();
/// let tip = dag.chain(["feature", "base"]).unwrap();
///
/// let mut out = Vec::new();
/// let mut graph = Graph::with_options(
///     &dag,
///     &mut out,
///     GraphOptions {
///         use_color: false,
///         ..Default::default()
///     },
/// );
/// graph.render(&[tip])?;
/// drop(graph);
///
/// assert_eq!(String::from_utf8(out).unwrap(), "* feature\n* base\n");
/// # Ok::<(), asciidag::graph::Error>(())
/// ```
pub struct Graph<'a, W: Write> {
    dag: &'a Dag,
    out: W,
    buf: String,
    first_parent_only: bool,
    use_color: bool,
    column_colors: Vec<String>,

    /// The node currently being rendered.
    commit: Option<NodeId>,

    /// How many of the current node's parents will be drawn. With
    /// `first_parent_only` this can be smaller than the real parent count.
    num_parents: usize,

    /// Width of the graph output for the current node. Every row is padded
    /// to this width so text after the graph stays aligned.
    width: usize,

    /// The next expansion row to print while in the `PreCommit` state.
    expansion_row: usize,

    state: GraphState,

    /// The state of the previous row of output, which decides how the first
    /// row of a merge joins onto the row above it.
    prev_state: GraphState,

    /// Index of the column tracking the current node, or `columns.len()`
    /// if no incoming column does.
    commit_index: usize,
    prev_commit_index: usize,

    /// Column state before the current node's row.
    columns: Vec<Column>,

    /// Column state after the current node's row.
    new_columns: Vec<Column>,

    /// For each screen position, the target column of the branch line at
    /// that position, or `None` if the position is empty. Two entries per
    /// column: even positions are the column slots, odd positions the gaps
    /// between them.
    mapping: Vec<Option<usize>>,

    /// Scratch space for computing the next `mapping` while emitting a
    /// collapsing row.
    new_mapping: Vec<Option<usize>>,

    /// Index into `column_colors` of the most recently assigned color.
    default_column_color: usize,
}

impl<W: Write> Debug for Graph<'_, W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<Graph state={:?} columns={}>",
            self.state,
            self.columns.len()
        )
    }
}

impl<'a, W: Write> Graph<'a, W> {
    /// Construct a renderer with default options.
    pub fn new(dag: &'a Dag, out: W) -> Self {
        Self::with_options(dag, out, GraphOptions::default())
    }

    /// Construct a renderer with the given options.
    pub fn with_options(dag: &'a Dag, out: W, options: GraphOptions) -> Self {
        let GraphOptions {
            first_parent_only,
            use_color,
            column_colors,
        } = options;
        let column_colors = column_colors.unwrap_or_else(|| {
            COLUMN_COLORS_ANSI
                .iter()
                .map(|color| (*color).to_string())
                .collect()
        });
        assert!(
            !column_colors.is_empty(),
            "column palette must at least contain a reset sequence"
        );
        Graph {
            dag,
            out,
            buf: String::new(),
            first_parent_only,
            use_color,
            // Start at the last palette entry so that the first increment
            // lands on index 0.
            default_column_color: column_colors.len() - 1,
            column_colors,
            commit: None,
            num_parents: 0,
            width: 0,
            expansion_row: 0,
            state: GraphState::Padding,
            prev_state: GraphState::Padding,
            commit_index: 0,
            prev_commit_index: 0,
            columns: Vec::new(),
            new_columns: Vec::new(),
            mapping: Vec::new(),
            new_mapping: Vec::new(),
        }
    }

    /// Render the graphs reachable from `tips` to the sink.
    ///
    /// Tips are walked, de-duplicated, and sorted topologically before
    /// rendering. Each node's principal row is followed by its label and a
    /// newline; any remaining branch-line rows follow, one per line.
    #[instrument]
    pub fn render(&mut self, tips: &[NodeId]) -> Result<(), Error> {
        let walked = walk(self.dag, tips).first_parent_only(self.first_parent_only);
        let nodes: Vec<NodeId> = toposort(self.dag, unique(walked)).collect();
        for node in nodes {
            self.update(node);
            self.show_commit()?;
            let dag = self.dag;
            self.out.write_all(dag.get(node).label.as_bytes())?;
            if !self.is_commit_finished() {
                self.out.write_all(b"\n")?;
                self.show_remainder()?;
            }
            self.out.write_all(b"\n")?;
        }
        Ok(())
    }

    /// Prepare the column model and the state machine for rendering
    /// `node`.
    ///
    /// Nodes must be supplied in an order where every node precedes its
    /// parents; see [`toposort`].
    #[instrument]
    pub fn update(&mut self, node: NodeId) {
        self.commit = Some(node);
        self.num_parents = self.interesting_parents(node).count();

        self.prev_commit_index = self.commit_index;
        self.update_columns();
        self.expansion_row = 0;

        // prev_state is deliberately not touched here: no row for the
        // current state was ever printed.
        if self.state != GraphState::Padding {
            // The previous node never finished its output.
            self.state = GraphState::Skip;
        } else if self.num_parents >= 3 && self.commit_index + 1 < self.columns.len() {
            // An octopus merge with branch lines to its right needs
            // expansion rows to open space around it first.
            self.state = GraphState::PreCommit;
        } else {
            self.state = GraphState::Commit;
        }
    }

    /// Emit rows up to and including the current node's principal row.
    ///
    /// The principal row is not newline-terminated, so the caller can
    /// append the node's label text (see [`Graph::writer`]).
    pub fn show_commit(&mut self) -> Result<(), Error> {
        let mut shown_commit_line = false;

        // When called without an update (for example to interleave other
        // output between two nodes), just extend the branch lines by one
        // padding row.
        if self.is_commit_finished() {
            self.show_padding()?;
            shown_commit_line = true;
        }

        while !shown_commit_line && !self.is_commit_finished() {
            shown_commit_line = self.next_line();
            self.out.write_all(self.buf.as_bytes())?;
            if !shown_commit_line {
                self.out.write_all(b"\n")?;
            }
            self.buf.clear();
        }
        Ok(())
    }

    /// Emit the rows remaining after the principal row, newline-terminated
    /// except for the last. Returns whether any rows were written.
    pub fn show_remainder(&mut self) -> Result<bool, Error> {
        if self.is_commit_finished() {
            return Ok(false);
        }
        loop {
            self.next_line();
            self.out.write_all(self.buf.as_bytes())?;
            self.buf.clear();
            if self.is_commit_finished() {
                return Ok(true);
            }
            self.out.write_all(b"\n")?;
        }
    }

    /// Emit one row of vertical padding, extending the branch lines
    /// downward without otherwise changing them.
    pub fn show_padding(&mut self) -> Result<(), Error> {
        self.padding_line();
        self.out.write_all(self.buf.as_bytes())?;
        self.buf.clear();
        Ok(())
    }

    /// Whether all rows for the current node have been emitted.
    pub fn is_commit_finished(&self) -> bool {
        self.state == GraphState::Padding
    }

    /// Access the underlying sink, e.g. to append label text after
    /// [`Graph::show_commit`].
    pub fn writer(&mut self) -> &mut W {
        &mut self.out
    }

    /// The parents of `node` that will appear in the output.
    fn interesting_parents(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        let parents = self.dag.get(node).parents.as_slice();
        let count = if self.first_parent_only {
            parents.len().min(1)
        } else {
            parents.len()
        };
        parents[..count].iter().copied()
    }

    fn current_commit(&self) -> NodeId {
        match self.commit {
            Some(commit) => commit,
            None => panic!("no node to render; update() was never called"),
        }
    }

    fn update_state(&mut self, state: GraphState) {
        self.prev_state = self.state;
        self.state = state;
    }

    fn current_column_color(&self) -> Option<usize> {
        if self.use_color {
            Some(self.default_column_color)
        } else {
            None
        }
    }

    fn increment_column_color(&mut self) {
        self.default_column_color = (self.default_column_color + 1) % self.column_colors.len();
    }

    /// The color of the column already tracking `commit`, if any, else the
    /// current default color.
    fn find_commit_color(&self, commit: NodeId) -> Option<usize> {
        self.columns
            .iter()
            .find(|column| column.commit == commit)
            .map(|column| column.color)
            .unwrap_or_else(|| self.current_column_color())
    }

    fn find_new_column_by_commit(&self, commit: NodeId) -> Option<Column> {
        self.new_columns
            .iter()
            .find(|column| column.commit == commit)
            .copied()
    }

    /// Append a glyph for `col`, wrapped in its color and the reset
    /// sequence when color is enabled.
    fn write_column(&mut self, col: Column, col_char: char) {
        if let Some(color) = col.color {
            self.buf.push_str(&self.column_colors[color]);
            self.buf.push(col_char);
            let reset = self
                .column_colors
                .last()
                .expect("palette is validated to be non-empty");
            self.buf.push_str(reset);
        } else {
            self.buf.push(col_char);
        }
    }

    /// Record `commit` in `new_columns`, reusing an existing entry if one
    /// already tracks it, and point `mapping` at it. Returns the next
    /// mapping write position.
    fn insert_into_new_columns(&mut self, commit: NodeId, mapping_index: usize) -> usize {
        if let Some(index) = self
            .new_columns
            .iter()
            .position(|column| column.commit == commit)
        {
            self.mapping[mapping_index] = Some(index);
            return mapping_index + 2;
        }

        let column = Column {
            commit,
            color: self.find_commit_color(commit),
        };
        self.new_columns.push(column);
        self.mapping[mapping_index] = Some(self.new_columns.len() - 1);
        mapping_index + 2
    }

    /// Compute the width of the widest row for the current node. Every
    /// other row is padded out to it.
    fn update_width(&mut self, is_commit_in_existing_columns: bool) {
        // One slot per existing column plus one per parent added by this
        // node.
        let mut max_cols = self.columns.len() + self.num_parents;

        // A node with no parents to draw still occupies a column.
        if self.num_parents < 1 {
            max_cols += 1;
        }

        // The node itself was counted along with its parents; if an
        // incoming column already tracks it, it was counted twice.
        if is_commit_in_existing_columns {
            max_cols -= 1;
        }

        // Each column takes up two character positions.
        self.width = max_cols * 2;
    }

    /// Rebuild `new_columns` and `mapping` for the current node: its
    /// interesting parents replace the column tracking it, every other
    /// incoming lineage is carried over, and `mapping` records where each
    /// branch line has to end up once collapsing finishes.
    fn update_columns(&mut self) {
        let commit = self.current_commit();

        // The previous new-state becomes the current state; the old buffer
        // is recycled for this node's new state.
        mem::swap(&mut self.columns, &mut self.new_columns);
        self.new_columns.clear();

        let max_new_columns = self.columns.len() + self.num_parents;
        self.mapping.clear();
        self.mapping.resize(2 * max_new_columns, None);

        let mut seen_this = false;
        let mut mapping_idx = 0;
        let mut is_commit_in_columns = true;
        // Walk the incoming columns plus one virtual column at the end that
        // stands in for the node itself, in case nothing tracks it yet (a
        // fresh tip with no rendered children).
        for i in 0..=self.columns.len() {
            let col_commit = if i == self.columns.len() {
                if seen_this {
                    break;
                }
                is_commit_in_columns = false;
                commit
            } else {
                self.columns[i].commit
            };

            if col_commit == commit {
                let old_mapping_idx = mapping_idx;
                seen_this = true;
                self.commit_index = i;
                let parents: Vec<NodeId> = self.interesting_parents(commit).collect();
                for parent in parents {
                    // A merge, or the start of a new childless column, gets
                    // fresh colors for the branches it opens.
                    if self.num_parents > 1 || !is_commit_in_columns {
                        self.increment_column_color();
                    }
                    mapping_idx = self.insert_into_new_columns(parent, mapping_idx);
                }
                // The node occupies two character positions even with no
                // parents to draw.
                if mapping_idx == old_mapping_idx {
                    mapping_idx += 2;
                }
            } else {
                mapping_idx = self.insert_into_new_columns(col_commit, mapping_idx);
            }
        }

        // Drop the unused tail of the mapping.
        while self.mapping.len() > 1 && self.mapping.last() == Some(&None) {
            self.mapping.pop();
        }

        self.update_width(is_commit_in_columns);
    }

    /// A mapping is settled once every branch line is at its target, or one
    /// position to its right (the next row's `/` makes that look correct).
    fn is_mapping_correct(&self) -> bool {
        self.mapping
            .iter()
            .enumerate()
            .all(|(i, target)| match target {
                Some(target) => *target == i / 2,
                None => true,
            })
    }

    /// Pad the current row with spaces out to `width`, keeping the text
    /// after the graph aligned across all of the node's rows.
    fn pad_horizontally(&mut self, chars_written: usize) {
        if chars_written < self.width {
            let padding = self.width - chars_written;
            self.buf.push_str(&" ".repeat(padding));
        }
    }

    /// A row that leaves every branch line unchanged.
    fn output_padding_line(&mut self) {
        for i in 0..self.new_columns.len() {
            let col = self.new_columns[i];
            self.write_column(col, '|');
            self.buf.push(' ');
        }
        self.pad_horizontally(self.new_columns.len() * 2);
    }

    /// An ellipsis row marking a portion of the graph that is missing.
    fn output_skip_line(&mut self) {
        self.buf.push_str("...");
        self.pad_horizontally(3);

        if self.num_parents >= 3 && self.commit_index + 1 < self.columns.len() {
            self.update_state(GraphState::PreCommit);
        } else {
            self.update_state(GraphState::Commit);
        }
    }

    /// One expansion row, widening the gap around an octopus merge so its
    /// parent fan fits. Two such rows are needed for every parent past the
    /// second.
    fn output_pre_commit_line(&mut self) {
        let commit = self.current_commit();
        assert!(
            self.num_parents >= 3,
            "not enough parents to add expansion row"
        );
        let num_expansion_rows = (self.num_parents - 2) * 2;
        assert!(
            self.expansion_row < num_expansion_rows,
            "wrong number of expansion rows"
        );

        let mut seen_this = false;
        let mut chars_written = 0;
        for i in 0..self.columns.len() {
            let col = self.columns[i];
            if col.commit == commit {
                seen_this = true;
                self.write_column(col, '|');
                self.buf.push_str(&" ".repeat(self.expansion_row));
                chars_written += 1 + self.expansion_row;
            } else if seen_this && self.expansion_row == 0 {
                // The first expansion row continues any `\` started by a
                // preceding merge's fan-out row.
                if self.prev_state == GraphState::PostMerge && self.prev_commit_index < i {
                    self.write_column(col, '\\');
                } else {
                    self.write_column(col, '|');
                }
                chars_written += 1;
            } else if seen_this && self.expansion_row > 0 {
                self.write_column(col, '\\');
                chars_written += 1;
            } else {
                self.write_column(col, '|');
                chars_written += 1;
            }
            self.buf.push(' ');
            chars_written += 1;
        }
        self.pad_horizontally(chars_written);

        self.expansion_row += 1;
        if self.expansion_row >= num_expansion_rows {
            self.update_state(GraphState::Commit);
        }
    }

    /// The dashes joining an octopus merge's node glyph to the columns of
    /// its third and later parents, ending in a `.`. Returns the number of
    /// characters written.
    fn draw_octopus_merge(&mut self) -> usize {
        let commit = self.current_commit();
        // The first two parents fit under the node glyph without dashes.
        let dash_parents: Vec<NodeId> = self.interesting_parents(commit).skip(2).collect();
        let mut num_chars = 0;
        for (index, parent) in dash_parents.iter().enumerate() {
            let col = self
                .find_new_column_by_commit(*parent)
                .expect("octopus parent has no column");
            self.write_column(col, '-');
            num_chars += 1;
            if index + 1 < dash_parents.len() {
                self.write_column(col, '-');
            } else {
                self.write_column(col, '.');
            }
            num_chars += 1;
        }
        num_chars
    }

    /// The principal row: the node glyph, plus the incoming branch lines
    /// around it.
    fn output_commit_line(&mut self) {
        let commit = self.current_commit();
        let mut seen_this = false;
        let mut chars_written = 0;
        // As in update_columns, one virtual trailing column stands in for a
        // node no incoming column tracks.
        for i in 0..=self.columns.len() {
            let col_commit = if i == self.columns.len() {
                if seen_this {
                    break;
                }
                commit
            } else {
                self.columns[i].commit
            };

            if col_commit == commit {
                seen_this = true;
                self.buf.push('*');
                chars_written += 1;

                if self.num_parents > 2 {
                    chars_written += self.draw_octopus_merge();
                }
            } else if seen_this && self.num_parents > 2 {
                let col = self.columns[i];
                self.write_column(col, '\\');
                chars_written += 1;
            } else if seen_this && self.num_parents == 2 {
                // A two-way merge has no expansion rows, so this is the
                // node's first row. Continue any `\` started by a
                // preceding merge's fan-out row.
                let col = self.columns[i];
                if self.prev_state == GraphState::PostMerge && self.prev_commit_index < i {
                    self.write_column(col, '\\');
                } else {
                    self.write_column(col, '|');
                }
                chars_written += 1;
            } else {
                let col = self.columns[i];
                self.write_column(col, '|');
                chars_written += 1;
            }
            self.buf.push(' ');
            chars_written += 1;
        }
        self.pad_horizontally(chars_written);

        if self.num_parents > 1 {
            self.update_state(GraphState::PostMerge);
        } else if self.is_mapping_correct() {
            self.update_state(GraphState::Padding);
        } else {
            self.update_state(GraphState::Collapsing);
        }
    }

    /// The row after a merge's principal row, fanning out to the columns of
    /// its parents.
    fn output_post_merge_line(&mut self) {
        let commit = self.current_commit();
        let mut seen_this = false;
        let mut chars_written = 0;
        for i in 0..=self.columns.len() {
            let col_commit = if i == self.columns.len() {
                if seen_this {
                    break;
                }
                commit
            } else {
                self.columns[i].commit
            };

            if col_commit == commit {
                seen_this = true;
                // The merge's edges are drawn with the parents' new
                // columns, so each branch starts out in its own color.
                let parents: Vec<NodeId> = self.interesting_parents(commit).collect();
                let mut parents = parents.into_iter();
                let first_parent = parents.next().expect("merge has no parents");
                let col = self
                    .find_new_column_by_commit(first_parent)
                    .expect("merge parent has no column");
                self.write_column(col, '|');
                chars_written += 1;
                for parent in parents {
                    let col = self
                        .find_new_column_by_commit(parent)
                        .expect("merge parent has no column");
                    self.write_column(col, '\\');
                    self.buf.push(' ');
                }
                chars_written += (self.num_parents - 1) * 2;
            } else if seen_this {
                let col = self.columns[i];
                self.write_column(col, '\\');
                self.buf.push(' ');
                chars_written += 2;
            } else {
                let col = self.columns[i];
                self.write_column(col, '|');
                self.buf.push(' ');
                chars_written += 2;
            }
        }
        self.pad_horizontally(chars_written);

        if self.is_mapping_correct() {
            self.update_state(GraphState::Padding);
        } else {
            self.update_state(GraphState::Collapsing);
        }
    }

    /// One collapsing row, moving at most one branch line leftward (plus
    /// any lines that merge into the branch on their left), then drawing
    /// the `/`, `_`, and `|` glyphs that show the migration.
    fn output_collapsing_line(&mut self) {
        let mut used_horizontal = false;
        let mut horizontal_edge: Option<usize> = None;
        let mut horizontal_edge_target: Option<usize> = None;

        self.new_mapping.clear();
        self.new_mapping.resize(self.mapping.len(), None);

        for i in 0..self.mapping.len() {
            let target = match self.mapping[i] {
                Some(target) => target,
                None => continue,
            };

            // update_columns inserts the leftmost column first, so a branch
            // line's target is never to the right of its current position.
            // Whenever branches cross, only one of them is moving.
            assert!(
                target * 2 <= i,
                "position {i} targeting column {}",
                target * 2
            );

            if target * 2 == i {
                // Already in place.
                assert_eq!(self.new_mapping[i], None);
                self.new_mapping[i] = Some(target);
            } else if self.new_mapping[i - 1].is_none() {
                // Nothing on the left; move left by one position. The
                // first such branch on the row may also pull further left
                // through a horizontal run of `_`.
                self.new_mapping[i - 1] = Some(target);
                if horizontal_edge.is_none() {
                    horizontal_edge = Some(i);
                    horizontal_edge_target = Some(target);
                    // The first horizontal position on screen is two to the
                    // right of the target column's own slot.
                    let mut j = target * 2 + 3;
                    while i >= 2 && j < i - 2 {
                        self.new_mapping[j] = Some(target);
                        j += 2;
                    }
                }
            } else if self.new_mapping[i - 1] == Some(target) {
                // The branch on the left shares our parent; merge into it.
            } else {
                // Cross over the branch on the left: the gap beyond it must
                // be empty, and the branch past that gap must be our
                // target.
                assert!(self.new_mapping[i - 1] > Some(target));
                assert_eq!(self.new_mapping[i - 2], None);
                assert_eq!(self.new_mapping[i - 3], Some(target));
                self.new_mapping[i - 2] = Some(target);
                // Claim the horizontal edge so no other branch moves
                // horizontally on this row.
                if horizontal_edge.is_none() {
                    horizontal_edge = Some(i);
                }
            }
        }

        // The new mapping may be one entry shorter than the old one.
        if self.new_mapping.last() == Some(&None) {
            self.new_mapping.pop();
        }

        for i in 0..self.new_mapping.len() {
            let target = match self.new_mapping[i] {
                Some(target) => target,
                None => {
                    self.buf.push(' ');
                    continue;
                }
            };

            if target * 2 == i {
                let col = self.new_columns[target];
                self.write_column(col, '|');
            } else if Some(target) == horizontal_edge_target && Some(i + 1) != horizontal_edge {
                // Only the first segment of the horizontal run survives
                // into the next row's mapping.
                if i != target * 2 + 3 {
                    self.new_mapping[i] = None;
                }
                used_horizontal = true;
                let col = self.new_columns[target];
                self.write_column(col, '_');
            } else {
                if used_horizontal && horizontal_edge.map_or(false, |edge| i < edge) {
                    self.new_mapping[i] = None;
                }
                let col = self.new_columns[target];
                self.write_column(col, '/');
            }
        }

        self.pad_horizontally(self.new_mapping.len());
        mem::swap(&mut self.mapping, &mut self.new_mapping);

        // Stay in the collapsing state until every branch line has reached
        // its final position.
        if self.is_mapping_correct() {
            self.update_state(GraphState::Padding);
        }
    }

    /// Format the next row into the line buffer. Returns whether it was the
    /// principal row.
    fn next_line(&mut self) -> bool {
        let prev_state = self.state;
        match self.state {
            GraphState::Padding => self.output_padding_line(),
            GraphState::Skip => self.output_skip_line(),
            GraphState::PreCommit => self.output_pre_commit_line(),
            GraphState::Commit => self.output_commit_line(),
            GraphState::PostMerge => self.output_post_merge_line(),
            GraphState::Collapsing => self.output_collapsing_line(),
        }
        prev_state == GraphState::Commit
    }

    /// Like `next_line`, but guaranteed never to print the principal row:
    /// if that row would be next, a row of plain vertical padding is
    /// produced instead, leaving the branch lines unchanged.
    fn padding_line(&mut self) {
        if self.state != GraphState::Commit {
            self.next_line();
            return;
        }

        for i in 0..self.columns.len() {
            let col = self.columns[i];
            self.write_column(col, '|');
            if Some(col.commit) == self.commit && self.num_parents > 2 {
                let gap = (self.num_parents - 2) * 2;
                self.buf.push_str(&" ".repeat(gap));
            } else {
                self.buf.push(' ');
            }
        }
        self.pad_horizontally(self.columns.len());

        // A padding row went out in place of the principal row.
        self.prev_state = GraphState::Padding;
    }
}
