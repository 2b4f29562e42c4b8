//! The key-value contract, checked against both adapter backends.

use nedb_core::{AdapterError, StorageAdapter};
use nedb_testkit::prelude::*;
use serde_json::json;

fn contract(adapter: &dyn StorageAdapter) {
    assert!(adapter.all().unwrap().is_empty());

    let inserted = adapter
        .insert("app1", doc(json!({"image": "nginx", "port": 80})))
        .unwrap();
    assert_eq!(inserted, doc(json!({"image": "nginx", "port": 80})));
    assert_eq!(adapter.get("app1").unwrap(), inserted);

    let err = adapter.insert("app1", doc(json!({"port": 1}))).unwrap_err();
    assert_eq!(err.code(), "ERR_ALREADY_EXISTS");
    assert_eq!(adapter.get("app1").unwrap(), inserted);

    let updated = adapter.update("app1", doc(json!({"port": 8080}))).unwrap();
    assert_eq!(updated, doc(json!({"image": "nginx", "port": 8080})));

    let replaced = adapter.set("app1", doc(json!({"tag": "latest"}))).unwrap();
    assert_eq!(replaced, doc(json!({"tag": "latest"})));

    adapter.set("app2", doc(json!({"nested": {"a": [1, 2]}}))).unwrap();
    let entries = adapter.all().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries["app2"], doc(json!({"nested": {"a": [1, 2]}})));
    assert_eq!(adapter.iter().unwrap().count(), 2);

    adapter.remove("app1").unwrap();
    let err = adapter.remove("app1").unwrap_err();
    assert!(matches!(err, AdapterError::NotFound { ref key } if key == "app1"));
    assert_eq!(err.to_string(), "`app1` not found.");
    assert!(adapter.get("app1").unwrap_err().is_not_found());
    assert!(adapter
        .update("app1", doc(json!({"x": 1})))
        .unwrap_err()
        .is_not_found());
}

#[test]
fn nedb_adapter_honors_contract() {
    with_temp_store(|store| contract(&store.nedb("apps")));
}

#[test]
fn fs_adapter_honors_contract() {
    with_temp_store(|store| contract(&store.fs("apps")));
}

#[test]
fn collections_are_isolated() {
    with_temp_store(|store| {
        let apps = store.nedb("apps");
        let volumes = store.nedb("volumes");
        apps.set("shared", doc(json!({"kind": "app"}))).unwrap();

        assert!(volumes.get("shared").unwrap_err().is_not_found());
        assert!(volumes.all().unwrap().is_empty());
    });
}

#[test]
fn nedb_reload_keeps_live_documents_only() {
    with_temp_store(|store| {
        {
            let apps = store.nedb("apps");
            scenarios::populate(&apps, 4);
            apps.remove("app1").unwrap();
            apps.update("app2", doc(json!({"port": 1}))).unwrap();
        }

        let apps = store.nedb("apps");
        let entries = apps.all().unwrap();
        assert_eq!(
            entries.keys().collect::<Vec<_>>(),
            vec!["app0", "app2", "app3"]
        );
        assert_eq!(entries["app2"]["port"], json!(1));

        // Load compacts to one line per live document.
        let text = std::fs::read_to_string(apps.path()).unwrap();
        assert_eq!(text.lines().filter(|line| !line.is_empty()).count(), 3);
    });
}

#[test]
fn nedb_datafile_is_newline_delimited_json() {
    with_temp_store(|store| {
        let apps = store.nedb("apps");
        apps.insert("app1", doc(json!({"port": 80}))).unwrap();
        apps.remove("app1").unwrap();

        let text = std::fs::read_to_string(apps.path()).unwrap();
        let lines: Vec<serde_json::Value> = text
            .lines()
            .filter(|line| !line.is_empty())
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(
            lines,
            vec![
                json!({"_id": "app1", "port": 80}),
                json!({"$$deleted": true, "_id": "app1"}),
            ]
        );
    });
}

#[test]
fn overlapping_adapters_keep_every_write() {
    with_temp_store(|store| {
        let first = store.nedb("apps");
        first.set("k1", doc(json!({"n": 1}))).unwrap();

        // Opening a second adapter loads the collection again.
        let second = store.nedb("apps");
        assert_eq!(second.get("k1").unwrap(), doc(json!({"n": 1})));

        first.set("k2", doc(json!({"n": 2}))).unwrap();
        second.insert("k3", doc(json!({"n": 3}))).unwrap();
        assert!(second.get("k2").is_ok());
        assert!(first.get("k3").is_ok());
        drop(first);
        drop(second);

        let reopened = store.nedb("apps");
        assert_eq!(
            reopened.all().unwrap().keys().collect::<Vec<_>>(),
            vec!["k1", "k2", "k3"]
        );
    });
}

#[test]
fn racing_inserts_across_adapters_have_one_winner() {
    with_temp_store(|store| {
        let first = store.nedb("apps");
        let second = store.nedb("apps");

        let results = std::thread::scope(|scope| {
            let a = scope.spawn(|| first.insert("app1", doc(json!({"by": "first"}))));
            let b = scope.spawn(|| second.insert("app1", doc(json!({"by": "second"}))));
            [a.join().unwrap(), b.join().unwrap()]
        });

        let rejected = results
            .iter()
            .filter(|result| matches!(result, Err(err) if err.is_already_exists()))
            .count();
        assert_eq!(rejected, 1);
        let winner = results.iter().find_map(|result| result.as_ref().ok()).unwrap();
        assert_eq!(&first.get("app1").unwrap(), winner);
    });
}
