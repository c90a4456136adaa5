use flotilla_graph::Graph;

use crate::backend::{Backend as _, DotBackend, DotOptions};
use crate::{ColocateError, Error, ExpandError, LinkError, ShardsError, compile};

fn ids(graph: &Graph) -> Vec<&str> {
    graph.ids().collect()
}

fn edge_count(graph: &Graph) -> usize {
    graph.iter().map(|node| node.depends_on.len()).sum()
}

const COLOCATED: &str = r#"
version: 1
shards:
  sor: 2
apps:
  sor:
    depends_on: [api]
  moop:
    same_host_as: sor
    depends_on: [db]
  api: {}
  db: {}
"#;

#[test]
fn singleton_node_id_is_the_app_name() {
    let graph = compile("version: 1\napps:\n  api: {}\n").unwrap();
    assert_eq!(ids(&graph), ["api"]);
    assert_eq!(graph.node("api").unwrap().shard, 0);
    assert!(graph.node("api").unwrap().host_group.is_none());
}

#[test]
fn sharded_app_produces_suffixed_nodes() {
    let graph = compile("version: 1\nshards:\n  sor: 3\napps:\n  sor: {}\n").unwrap();
    assert_eq!(ids(&graph), ["sor-00", "sor-01", "sor-02"]);

    // No co-location partner: no host group even with multiple shards.
    assert!(graph.iter().all(|node| node.host_group.is_none()));
}

#[test]
fn colocation_propagates_shard_count_and_host_groups() {
    let graph = compile(COLOCATED).unwrap();
    assert_eq!(
        ids(&graph),
        ["api", "db", "moop-00", "moop-01", "sor-00", "sor-01"]
    );

    // moop declared no shard count but inherits 2 from sor via the group,
    // and shard i of both carries the same host group ID.
    for shard in ["00", "01"] {
        let sor = graph.node(&format!("sor-{shard}")).unwrap();
        let moop = graph.node(&format!("moop-{shard}")).unwrap();
        assert_eq!(sor.host_group, moop.host_group);
        assert_eq!(
            sor.host_group.as_deref(),
            Some(format!("hostgroup-moop-{shard}").as_str())
        );
    }
}

#[test]
fn pairwise_n_to_1_links_every_shard_to_the_singleton() {
    let graph = compile("version: 1\nshards:\n  x: 3\napps:\n  x:\n    depends_on: [y]\n  y: {}\n")
        .unwrap();

    for shard in ["x-00", "x-01", "x-02"] {
        assert_eq!(graph.node(shard).unwrap().depends_on, ["y"]);
    }
}

#[test]
fn pairwise_equal_counts_link_shard_for_shard() {
    let graph = compile(
        "version: 1\nshards:\n  x: 3\n  z: 3\napps:\n  x:\n    depends_on: [z]\n  z: {}\n",
    )
    .unwrap();

    for shard in 0..3 {
        let node = graph.node(&format!("x-{shard:02}")).unwrap();
        assert_eq!(node.depends_on, [format!("z-{shard:02}")]);
    }
}

#[test]
fn pairwise_mismatched_counts_are_ambiguous() {
    let err = compile(
        "version: 1\nshards:\n  x: 3\n  w: 2\napps:\n  x:\n    depends_on: [w]\n  w: {}\n",
    )
    .unwrap_err();

    assert!(matches!(
        err,
        Error::Link(LinkError::AmbiguousRatio {
            app_shards: 3,
            target_shards: 2,
            ..
        })
    ));
    assert!(err.to_string().contains("ambiguous"));
}

#[test]
fn fan_in_links_every_shard_to_every_shard() {
    let graph = compile(
        "version: 1\nshards:\n  x: 3\n  w: 2\napps:\n  x:\n    depends_on_all_of: [w]\n  w: {}\n",
    )
    .unwrap();

    assert_eq!(edge_count(&graph), 6);
    for shard in 0..3 {
        let node = graph.node(&format!("x-{shard:02}")).unwrap();
        assert_eq!(node.depends_on, ["w-00", "w-01"]);
    }
}

#[test]
fn unknown_pairwise_target_fails() {
    let err = compile("version: 1\napps:\n  x:\n    depends_on: [ghost]\n").unwrap_err();
    assert!(matches!(
        err,
        Error::Link(LinkError::UnknownTarget {
            relation: "depends_on",
            ..
        })
    ));
}

#[test]
fn unknown_fan_in_target_fails() {
    let err = compile("version: 1\napps:\n  x:\n    depends_on_all_of: [ghost]\n").unwrap_err();
    assert!(matches!(
        err,
        Error::Link(LinkError::UnknownTarget {
            relation: "depends_on_all_of",
            ..
        })
    ));
}

#[test]
fn unknown_colocation_target_fails() {
    let err = compile("version: 1\napps:\n  x:\n    same_host_as: ghost\n").unwrap_err();
    assert!(matches!(err, Error::Colocate(ColocateError::UnknownTarget { .. })));
}

#[test]
fn conflicting_shard_counts_in_a_group_fail() {
    let err = compile(
        "version: 1\nshards:\n  a: 2\n  b: 3\napps:\n  a: {}\n  b:\n    same_host_as: a\n",
    )
    .unwrap_err();

    match err {
        Error::Shards(ShardsError::ConflictingCounts {
            group,
            expected,
            found,
            ..
        }) => {
            assert_eq!(group, "a");
            assert_eq!((expected, found), (2, 3));
        }
        other => panic!("expected conflicting counts, got: {other}"),
    }
}

#[test]
fn shard_count_for_unknown_app_fails() {
    let err = compile("version: 1\nshards:\n  ghost: 2\napps:\n  a: {}\n").unwrap_err();
    assert!(matches!(err, Error::Shards(ShardsError::UnknownApp { .. })));
}

#[test]
fn zero_shard_count_fails() {
    let err = compile("version: 1\nshards:\n  a: 0\napps:\n  a: {}\n").unwrap_err();
    assert!(matches!(err, Error::Shards(ShardsError::InvalidCount { .. })));
}

#[test]
fn cycle_reports_path_in_dependency_order() {
    let err = compile(
        "version: 1\napps:\n  a:\n    depends_on: [b]\n  b:\n    depends_on: [c]\n  c:\n    depends_on: [a]\n",
    )
    .unwrap_err();

    assert!(matches!(err, Error::Cycle(_)));
    assert_eq!(
        err.to_string(),
        "dependency cycle detected: a -> b -> c -> a"
    );
}

const BLUEPRINTED: &str = r#"
version: 1
blueprints:
  faxer-stack:
    apps:
      receiver:
        depends_on: [muse]
        external_depends_on: [sender]
      muse: {}
apps:
  sor:
    uses:
      - blueprint: faxer-stack
        with:
          sender: global-sender
  global-sender: {}
"#;

#[test]
fn blueprint_expansion_synthesizes_colocated_apps() {
    let graph = compile(BLUEPRINTED).unwrap();
    assert_eq!(ids(&graph), ["global-sender", "sor", "sor-muse", "sor-receiver"]);

    // Synthesized apps share a host with their parent; the group root is
    // the lexicographically smallest member.
    let expected = Some("hostgroup-sor");
    assert_eq!(graph.node("sor").unwrap().host_group.as_deref(), expected);
    assert_eq!(graph.node("sor-muse").unwrap().host_group.as_deref(), expected);
    assert_eq!(
        graph.node("sor-receiver").unwrap().host_group.as_deref(),
        expected
    );
    assert!(graph.node("global-sender").unwrap().host_group.is_none());

    // Internal dependency re-joined to the parent, external resolved
    // through the `with` map.
    assert_eq!(
        graph.node("sor-receiver").unwrap().depends_on,
        ["global-sender", "sor-muse"]
    );
}

#[test]
fn blueprint_instance_flag_makes_parent_depend_on_children() {
    let graph = compile(
        r#"
version: 1
blueprints:
  stack:
    apps:
      worker: {}
      muse: {}
apps:
  sor:
    uses:
      - blueprint: stack
        depends_on: true
"#,
    )
    .unwrap();

    assert_eq!(graph.node("sor").unwrap().depends_on, ["sor-muse", "sor-worker"]);

    let order = graph.startup_order();
    assert_eq!(order.last().unwrap(), &vec!["sor".to_string()]);
}

#[test]
fn blueprint_instance_without_flag_leaves_parent_independent() {
    let graph = compile(
        r#"
version: 1
blueprints:
  stack:
    apps:
      worker: {}
apps:
  sor:
    uses:
      - blueprint: stack
"#,
    )
    .unwrap();

    assert!(graph.node("sor").unwrap().depends_on.is_empty());
}

#[test]
fn undefined_blueprint_fails() {
    let err = compile("version: 1\napps:\n  sor:\n    uses:\n      - blueprint: ghost\n")
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Expand(ExpandError::UndefinedBlueprint { .. })
    ));
}

#[test]
fn unresolved_external_dependency_fails() {
    let err = compile(
        r#"
version: 1
blueprints:
  stack:
    apps:
      worker:
        external_depends_on: [sender]
apps:
  sor:
    uses:
      - blueprint: stack
"#,
    )
    .unwrap_err();

    match err {
        Error::Expand(ExpandError::UnresolvedExternal { placeholder, .. }) => {
            assert_eq!(placeholder, "sender");
        }
        other => panic!("expected unresolved external, got: {other}"),
    }
}

#[test]
fn undefined_internal_dependency_fails() {
    let err = compile(
        r#"
version: 1
blueprints:
  stack:
    apps:
      worker:
        depends_on: [ghost]
apps:
  sor:
    uses:
      - blueprint: stack
"#,
    )
    .unwrap_err();

    assert!(matches!(
        err,
        Error::Expand(ExpandError::UndefinedInternal { .. })
    ));
}

#[test]
fn synthesized_name_collision_fails() {
    let err = compile(
        r#"
version: 1
blueprints:
  stack:
    apps:
      muse: {}
apps:
  sor:
    uses:
      - blueprint: stack
  sor-muse: {}
"#,
    )
    .unwrap_err();

    match err {
        Error::Expand(ExpandError::NameCollision { name, .. }) => {
            assert_eq!(name, "sor-muse");
        }
        other => panic!("expected name collision, got: {other}"),
    }
}

#[test]
fn restart_subgraph_includes_host_group_partners() {
    let graph = compile(COLOCATED).unwrap();
    let subgraph = graph.subgraph_for("sor-01").unwrap();

    // The caller named only sor-01, but moop-01 restarts with it, plus the
    // transitive dependencies of both.
    assert_eq!(ids(&subgraph), ["api", "db", "moop-01", "sor-01"]);
}

#[test]
fn startup_layers_respect_dependencies_and_shutdown_reverses() {
    let graph = compile(COLOCATED).unwrap();
    let startup = graph.startup_order();

    assert_eq!(
        startup,
        vec![
            vec!["api".to_string(), "db".to_string()],
            vec![
                "moop-00".to_string(),
                "moop-01".to_string(),
                "sor-00".to_string(),
                "sor-01".to_string(),
            ],
        ]
    );

    let mut reversed = startup.clone();
    reversed.reverse();
    assert_eq!(graph.shutdown_order(), reversed);

    let layer_of = |id: &str| {
        startup
            .iter()
            .position(|layer| layer.iter().any(|n| n == id))
            .unwrap()
    };
    for node in graph.iter() {
        for dep in &node.depends_on {
            assert!(layer_of(&node.id) > layer_of(dep));
        }
    }
}

#[test]
fn logical_view_collapses_shards_and_groups() {
    let graph = compile(COLOCATED).unwrap();
    let logical = graph.logical_view();

    assert_eq!(ids(&logical), ["api", "db", "moop", "sor"]);
    assert_eq!(logical.node("sor").unwrap().depends_on, ["api"]);
    assert!(logical.iter().all(|node| node.host_group.is_none()));
}

#[test]
fn compilation_is_deterministic() {
    let first = compile(COLOCATED).unwrap();
    let second = compile(COLOCATED).unwrap();

    assert_eq!(first, second);
    assert_eq!(first.startup_order(), second.startup_order());

    let opts = DotOptions {
        cluster_host_groups: true,
    };
    let backend = DotBackend { options: opts };
    assert_eq!(
        backend.emit(&first).unwrap(),
        backend.emit(&second).unwrap()
    );
}

#[test]
fn dot_render_clusters_host_groups() {
    let graph = compile(COLOCATED).unwrap();
    let dot = DotBackend {
        options: DotOptions {
            cluster_host_groups: true,
        },
    }
    .emit(&graph)
    .unwrap();

    assert!(dot.contains("subgraph \"cluster_hostgroup-moop-00\""));
    assert!(dot.contains("subgraph \"cluster_hostgroup-moop-01\""));
    assert!(dot.contains("  \"api\";"));
    assert!(dot.contains("\"sor-00\" -> \"api\";"));
}

#[test]
fn dot_render_without_clustering_lists_all_nodes_flat() {
    let graph = compile(COLOCATED).unwrap();
    let dot = DotBackend::default().emit(&graph).unwrap();

    assert!(!dot.contains("subgraph"));
    assert!(dot.contains("  \"moop-00\";"));
}

#[test]
fn schema_errors_surface_through_compile() {
    let err = compile("version: 1\nbogus: true\n").unwrap_err();
    assert!(matches!(err, Error::Topology(_)));
}
