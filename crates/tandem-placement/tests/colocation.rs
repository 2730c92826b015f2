//! End-to-end placement scenarios over an in-memory cluster.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tandem_namespace::{InMemoryNamespace, MetadataConnector, MetadataService, NamespaceError, StaticConnector};
use tandem_placement::{
    BlockPlacementPolicy, ColocatingPolicy, PlacementConfig, PlacementError, PlacementRequest, RackAwarePolicy,
};
use tandem_topology::{Datanode, NetworkTopology};

const BLOCK: u64 = 64;

struct Cluster {
    namespace: Arc<InMemoryNamespace>,
    topology: Arc<NetworkTopology>,
}

impl Cluster {
    fn new() -> Self {
        let mut topology = NetworkTopology::new();
        for (rack, names) in [("/r1", ["n1:1", "n2:1"]), ("/r2", ["n3:1", "n4:1"]), ("/r3", ["n5:1", "n6:1"])] {
            for name in names {
                topology.add(Datanode::new(rack, name, 1 << 40)).unwrap();
            }
        }
        Self {
            namespace: Arc::new(InMemoryNamespace::new()),
            topology: Arc::new(topology),
        }
    }

    fn node(&self, path: &str) -> Datanode {
        self.topology.get_node(path).unwrap().clone()
    }

    fn write(&self, path: &str, blocks: &[&[&str]]) {
        self.namespace.create_file(path, BLOCK, 3).unwrap();
        for replicas in blocks {
            self.namespace
                .append_block(path, replicas.iter().map(|r| r.to_string()).collect())
                .unwrap();
        }
    }

    fn colocating(&self) -> ColocatingPolicy {
        let connector = Arc::new(StaticConnector::new(self.namespace.clone()));
        let mut policy = ColocatingPolicy::with_connector(connector);
        policy
            .initialize(&PlacementConfig::default(), self.topology.clone(), self.topology.clone())
            .unwrap();
        policy
    }

    fn fallback(&self) -> RackAwarePolicy {
        let mut policy = RackAwarePolicy::new();
        policy
            .initialize(&PlacementConfig::default(), self.topology.clone(), self.topology.clone())
            .unwrap();
        policy
    }
}

fn paths(nodes: &[Datanode]) -> HashSet<String> {
    nodes.iter().map(Datanode::topology_path).collect()
}

#[test]
fn unmanaged_paths_match_fallback_exactly() {
    let cluster = Cluster::new();
    let colocating = cluster.colocating();
    let fallback = cluster.fallback();

    let writer = cluster.node("/r2/n3:1");
    let chosen = vec![cluster.node("/r1/n1:1")];
    let excluded = HashSet::from(["/r3/n5:1".to_string()]);
    let requests = [
        PlacementRequest::new("/user/logs/a", 3).block_size(BLOCK),
        PlacementRequest::new("/user/logs/a", 3).writer(&writer).block_size(BLOCK),
        PlacementRequest::new("/unmanaged/g1/a", 2).chosen(&chosen).excluding(&excluded),
        PlacementRequest::new("/managed/g1", 2).chosen(&chosen).return_chosen(true),
    ];
    for request in &requests {
        assert_eq!(
            colocating.choose_target(request).unwrap(),
            fallback.choose_target(request).unwrap(),
            "diverged for {}",
            request.src_path
        );
    }
}

#[test]
fn no_sibling_at_index_uses_fallback() {
    let cluster = Cluster::new();
    cluster.write("/managed/g1/a", &[&["/r1/n1:1", "/r2/n3:1"], &["/r1/n2:1", "/r2/n4:1"]]);
    cluster.write("/managed/g1/b", &[&["/r1/n1:1", "/r2/n3:1"], &["/r1/n2:1", "/r2/n4:1"]]);
    let colocating = cluster.colocating();

    // `a` has blocks 0 and 1; its next block is index 2, which no sibling has.
    assert!(colocating.resolve_candidates("/managed/g1/a").unwrap().is_empty());

    let writer = cluster.node("/r3/n6:1");
    let request = PlacementRequest::new("/managed/g1/a", 3).writer(&writer).block_size(BLOCK);
    assert_eq!(
        colocating.choose_target(&request).unwrap(),
        cluster.fallback().choose_target(&request).unwrap()
    );
}

#[test]
fn sibling_block_at_index_becomes_candidates() {
    let cluster = Cluster::new();
    cluster.write("/managed/g1/a", &[&["/r1/n1:1"], &["/r1/n2:1"]]);
    cluster.write(
        "/managed/g1/b",
        &[&["/r1/n1:1"], &["/r1/n2:1"], &["/r2/n3:1", "/r3/n5:1"]],
    );
    let colocating = cluster.colocating();

    let candidates = colocating.resolve_candidates("/managed/g1/a").unwrap();
    assert_eq!(
        paths(&candidates),
        HashSet::from(["/r2/n3:1".to_string(), "/r3/n5:1".to_string()])
    );
}

#[test]
fn colocated_targets_lead_then_chosen_nodes() {
    let cluster = Cluster::new();
    cluster.write("/managed/g1/a", &[]);
    cluster.write("/managed/g1/b", &[&["/r1/n1:1", "/r2/n3:1"]]);
    cluster.write("/managed/g1/c", &[]);
    let colocating = cluster.colocating();

    let chosen = vec![cluster.node("/r3/n6:1")];
    let targets = colocating
        .choose_target(&PlacementRequest::new("/managed/g1/a", 3).chosen(&chosen))
        .unwrap();

    assert_eq!(targets.len(), 3);
    assert_eq!(
        paths(&targets[..2]),
        HashSet::from(["/r1/n1:1".to_string(), "/r2/n3:1".to_string()])
    );
    assert_eq!(targets[2], chosen[0]);
}

#[test]
fn colocated_targets_are_truncated() {
    let cluster = Cluster::new();
    cluster.write("/managed/g1/b", &[&["/r1/n1:1", "/r2/n3:1", "/r3/n5:1"]]);
    let colocating = cluster.colocating();

    let chosen = vec![cluster.node("/r3/n6:1")];
    let targets = colocating
        .choose_target(&PlacementRequest::new("/managed/g1/new", 2).chosen(&chosen))
        .unwrap();
    assert_eq!(targets.len(), 2);
    assert!(!targets.contains(&chosen[0]));
}

#[test]
fn first_block_of_new_file_follows_siblings_first_block() {
    let cluster = Cluster::new();
    cluster.write("/data/managed/orders/part-0", &[&["/r1/n2:1", "/r2/n4:1"]]);
    let colocating = cluster.colocating();

    // The file does not exist yet, so its next block index is 0.
    let candidates = colocating.resolve_candidates("/data/managed/orders/part-1").unwrap();
    assert_eq!(
        paths(&candidates),
        HashSet::from(["/r1/n2:1".to_string(), "/r2/n4:1".to_string()])
    );
}

#[test]
fn groups_do_not_leak_into_each_other() {
    let cluster = Cluster::new();
    cluster.write("/managed/g1/a", &[&["/r1/n1:1"]]);
    cluster.write("/managed/g2/b", &[]);
    let colocating = cluster.colocating();

    assert!(colocating.resolve_candidates("/managed/g2/c").unwrap().is_empty());
}

#[test]
fn decommissioned_sibling_nodes_are_ignored() {
    let cluster = Cluster::new();
    cluster.write("/managed/g1/b", &[&["/r9/gone:1"]]);
    let colocating = cluster.colocating();

    assert!(colocating.resolve_candidates("/managed/g1/a").unwrap().is_empty());
    let request = PlacementRequest::new("/managed/g1/a", 2).block_size(BLOCK);
    assert_eq!(
        colocating.choose_target(&request).unwrap(),
        cluster.fallback().choose_target(&request).unwrap()
    );
}

#[test]
fn verification_is_delegated() {
    let cluster = Cluster::new();
    let colocating = cluster.colocating();
    let fallback = cluster.fallback();
    let block = tandem_placement::LocatedBlock {
        block: tandem_placement::Block {
            id: 1,
            num_bytes: BLOCK,
            generation_stamp: 1,
        },
        locations: vec![cluster.node("/r1/n1:1"), cluster.node("/r1/n2:1")],
    };
    for min_racks in 0..4 {
        assert_eq!(
            colocating.verify_block_placement("/managed/g1/a", &block, min_racks).unwrap(),
            fallback.verify_block_placement("/managed/g1/a", &block, min_racks).unwrap()
        );
    }
}

/// Metadata service whose directory listings always fail.
struct ListingDown(InMemoryNamespace);

impl MetadataService for ListingDown {
    fn file_status(&self, path: &str) -> tandem_namespace::Result<tandem_namespace::FileStatus> {
        self.0.file_status(path)
    }

    fn list_status(&self, dir: &str) -> tandem_namespace::Result<Vec<tandem_namespace::FileStatus>> {
        Err(NamespaceError::Unavailable(format!("list {dir}")))
    }

    fn block_locations(
        &self,
        file: &tandem_namespace::FileStatus,
        start: u64,
        len: u64,
    ) -> tandem_namespace::Result<Vec<tandem_namespace::BlockLocation>> {
        self.0.block_locations(file, start, len)
    }
}

#[test]
fn metadata_failure_fails_managed_writes_instead_of_falling_back() {
    let cluster = Cluster::new();
    let connector = Arc::new(StaticConnector::new(Arc::new(ListingDown(InMemoryNamespace::new()))));
    let mut policy = ColocatingPolicy::with_connector(connector);
    policy
        .initialize(&PlacementConfig::default(), cluster.topology.clone(), cluster.topology.clone())
        .unwrap();

    let result = policy.choose_target(&PlacementRequest::new("/managed/g1/a", 3));
    assert_eq!(
        result,
        Err(PlacementError::MetadataUnavailable(NamespaceError::Unavailable(
            "list /managed/g1/".into()
        )))
    );
    assert_eq!(
        policy
            .choose_target(&PlacementRequest::new("/user/a", 3))
            .unwrap()
            .len(),
        3
    );
}

#[test]
fn custom_segment_from_config() {
    let cluster = Cluster::new();
    cluster.write("/colo/g1/b", &[&["/r1/n1:1"]]);
    cluster.write("/managed/g1/b", &[&["/r2/n3:1"]]);

    let connector = Arc::new(StaticConnector::new(cluster.namespace.clone()));
    let mut policy = ColocatingPolicy::with_connector(connector);
    let config = PlacementConfig {
        managed_segment: "colo".into(),
        ..PlacementConfig::default()
    };
    policy
        .initialize(&config, cluster.topology.clone(), cluster.topology.clone())
        .unwrap();

    assert_eq!(
        paths(&policy.resolve_candidates("/colo/g1/a").unwrap()),
        HashSet::from(["/r1/n1:1".to_string()])
    );
    assert!(policy.resolve_candidates("/managed/g1/a").unwrap().is_empty());
}

struct CountingConnector {
    service: Arc<InMemoryNamespace>,
    connects: AtomicUsize,
}

impl MetadataConnector for CountingConnector {
    fn connect(&self, _endpoint: &str) -> tandem_namespace::Result<Arc<dyn MetadataService>> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        Ok(self.service.clone())
    }
}

#[test]
fn concurrent_requests_share_one_connection() {
    let cluster = Cluster::new();
    cluster.write("/managed/g1/b", &[&["/r1/n1:1", "/r2/n3:1"]]);
    let connector = Arc::new(CountingConnector {
        service: cluster.namespace.clone(),
        connects: AtomicUsize::new(0),
    });
    let mut policy = ColocatingPolicy::with_connector(connector.clone());
    policy
        .initialize(&PlacementConfig::default(), cluster.topology.clone(), cluster.topology.clone())
        .unwrap();

    std::thread::scope(|scope| {
        for i in 0..8 {
            let policy = &policy;
            scope.spawn(move || {
                let path = format!("/managed/g1/f{i}");
                let targets = policy.choose_target(&PlacementRequest::new(&path, 2)).unwrap();
                assert_eq!(
                    paths(&targets),
                    HashSet::from(["/r1/n1:1".to_string(), "/r2/n3:1".to_string()])
                );
            });
        }
    });
    assert_eq!(connector.connects.load(Ordering::SeqCst), 1);
}

#[test]
fn sibling_with_huge_blocks_still_colocates() {
    let cluster = Cluster::new();
    cluster.namespace.create_file("/managed/g/b", 1 << 62, 3).unwrap();
    for _ in 0..5 {
        cluster
            .namespace
            .append_block("/managed/g/b", vec!["/r1/n1:1".into(), "/r2/n3:1".into()])
            .unwrap();
    }

    let targets = cluster
        .colocating()
        .choose_target(&PlacementRequest::new("/managed/g/a", 1))
        .unwrap();
    assert_eq!(targets.len(), 1);
    assert!(HashSet::from(["/r1/n1:1".to_string(), "/r2/n3:1".to_string()]).contains(&targets[0].topology_path()));
}
