use std::path::PathBuf;

use sitespec::rules::{hostname_chain, RuleSetStore, DEFAULT_CACHE_CAPACITY};
use sitespec::{DirectoryStore, DomainResolver, Error, MemoryStore, RuleSet};

fn fixtures() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/sitespecs")
}

#[test]
fn chain_is_most_specific_first() {
    assert_eq!(
        hostname_chain("a.b.example.com"),
        ["a.b.example.com", "b.example.com", "example.com", "com"]
    );
    assert_eq!(hostname_chain("localhost"), ["localhost"]);
}

#[test]
fn longest_suffix_wins() {
    let resolver = DomainResolver::new(DirectoryStore::new(fixtures()));

    let rules = resolver.resolve("news.example.com").expect("example.com rules");
    assert_eq!(rules.body, vec![r#"//div[@id="content"]"#]);

    let rules = resolver.resolve("shop.com").expect("com rules");
    assert_eq!(rules.title, vec!["//title"]);
}

#[test]
fn empty_rule_file_falls_through_to_superdomain() {
    let store = DirectoryStore::new(fixtures());
    let blank = store.load("blank.org").expect("file exists");
    assert!(blank.is_empty());

    let resolver = DomainResolver::new(store);
    let rules = resolver.resolve("www.blank.org").expect("org rules");
    assert_eq!(rules.body, vec!["//main"]);
    assert!(!rules.prune);
}

#[test]
fn unknown_hostname_resolves_to_none() {
    let resolver = DomainResolver::cached(DirectoryStore::new(fixtures()));
    assert!(resolver.resolve("example.net").is_none());
    assert!(resolver.resolve("localhost").is_none());
    assert!(resolver.resolve("").is_none());
}

#[test]
fn directory_store_reports_missing_files() {
    let store = DirectoryStore::new(fixtures());
    assert!(matches!(store.load("missing.example"), Err(Error::RuleSetNotFound { .. })));
    assert!(matches!(store.load("../sitespecs/com"), Err(Error::RuleSetNotFound { .. })));
}

#[test]
fn flag_only_rule_set_is_not_empty() {
    let store = MemoryStore::new()
        .with_text("example.com", "prune: no")
        .with_text("com", "title: //h1");
    let rules = DomainResolver::new(store).resolve("example.com").expect("resolved");
    assert!(!rules.prune);
    assert!(rules.title.is_empty());
}

#[test]
fn cache_picks_up_edits_after_clear() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("example.com.txt");
    std::fs::write(&path, "title: //h1\n").expect("write");

    let resolver = DomainResolver::cached(DirectoryStore::new(dir.path()));
    assert_eq!(resolver.resolve("example.com").expect("rules").title, vec!["//h1"]);

    std::fs::write(&path, "title: //h2\n").expect("write");
    assert_eq!(resolver.resolve("example.com").expect("cached").title, vec!["//h1"]);

    resolver.clear_cache();
    assert_eq!(resolver.resolve("example.com").expect("reloaded").title, vec!["//h2"]);
}

#[test]
fn resolver_is_shareable_across_threads() {
    let resolver = std::sync::Arc::new(DomainResolver::cached(
        MemoryStore::new().with("example.com", RuleSet::parse("body: //article")),
    ));

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let resolver = std::sync::Arc::clone(&resolver);
            std::thread::spawn(move || resolver.resolve(&format!("s{i}.example.com")).is_some())
        })
        .collect();

    for handle in handles {
        assert!(handle.join().expect("thread"));
    }
}

#[test]
fn cache_stays_bounded_under_many_hostnames() {
    let resolver = DomainResolver::cached(MemoryStore::new().with_text("example.com", "title: //h1"));
    for i in 0..10_000 {
        let hostname = if i % 2 == 0 { format!("h{i}.example.com") } else { format!("h{i}.example.net") };
        assert_eq!(resolver.resolve(&hostname).is_some(), i % 2 == 0);
    }
    assert_eq!(resolver.cache_len(), DEFAULT_CACHE_CAPACITY);

    // Recent hostnames still resolve to the same rule set.
    assert_eq!(resolver.resolve("h9998.example.com").expect("cached").title, vec!["//h1"]);
    assert!(resolver.resolve("h9999.example.net").is_none());
}
