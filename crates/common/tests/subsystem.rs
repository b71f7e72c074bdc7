//! Integration tests for the jailed subsystem, the filesystem factory and
//! the user filesystem cache

mod common;

use std::sync::Arc;

use ::common::attributes::{self, AttributeMap, AttributeValue, PosixPermissions, PERMISSIONS};
use ::common::channel::OpenOptions;
use ::common::client::StorageClient;
use ::common::error::FsError;
use ::common::subsystem::JailedSubsystem;
use object_store::path::Path as ObjectPath;

#[tokio::test]
async fn test_unjailed_session() {
    let env = common::setup_test_env();
    let factory = env.file_system_factory("{username}", "");
    let session = common::session("bob");
    let fs = factory.create_file_system(&session).await.unwrap();
    let mut subsystem = env.subsystem_factory("{username}", "").create(session);
    subsystem.set_file_system(fs);

    let home = subsystem.resolve_file(".").unwrap();
    assert_eq!(home.path().as_str(), "/bucket/bob");

    let mut channel = subsystem
        .open("notes.txt", &OpenOptions::write_replace())
        .await
        .unwrap();
    channel.write(b"remember").await.unwrap();
    channel.close().await.unwrap();

    let entries = subsystem.list(".").await.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].name, "notes.txt");
    assert_eq!(
        entries[0].attributes[PERMISSIONS],
        AttributeValue::Permissions(PosixPermissions::owner_group_read_write())
    );

    let stat = subsystem.stat("/notes.txt").await.unwrap();
    assert_eq!(stat[attributes::SIZE].as_size(), Some(8));
}

#[tokio::test]
async fn test_jailed_session() {
    let env = common::setup_test_env();
    let factory = env.file_system_factory("users/{username}", "users");
    let session = common::session("bob");
    let fs = factory.create_file_system(&session).await.unwrap();
    let mut subsystem = env
        .subsystem_factory("users/{username}", "users")
        .create(session);
    subsystem.set_file_system(fs);

    // neither the bucket nor the jail is visible to the client
    assert_eq!(subsystem.resolve_file(".").unwrap().path().as_str(), "/bob/");
    assert_eq!(
        subsystem.resolve_file("/bob/docs").unwrap().path().as_str(),
        "/bob/docs"
    );

    subsystem.make_directory("/bob/docs").await.unwrap();
    let store = env.client.store(common::BUCKET).await.unwrap();
    assert!(store
        .head(&ObjectPath::from("users/bob/docs/.keep"))
        .await
        .is_ok());

    let entries = subsystem.list(".").await.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].name, "docs");
    assert_eq!(
        entries[0].attributes[attributes::IS_DIRECTORY].as_bool(),
        Some(true)
    );

    // a path outside the home is pulled back into it
    subsystem.remove("/alice/docs").await.unwrap();
    assert!(matches!(
        subsystem.stat("/bob/docs").await,
        Err(FsError::NotFound(_))
    ));
}

async fn write(subsystem: &JailedSubsystem, path: &str, data: &[u8]) {
    let mut channel = subsystem
        .open(path, &OpenOptions::write_replace())
        .await
        .unwrap();
    channel.write(data).await.unwrap();
    channel.close().await.unwrap();
}

async fn jailed_subsystem(env: &common::TestEnv) -> JailedSubsystem {
    let session = common::session("bob");
    let fs = env
        .file_system_factory("users/{username}", "users")
        .create_file_system(&session)
        .await
        .unwrap();
    let mut subsystem = env
        .subsystem_factory("users/{username}", "users")
        .create(session);
    subsystem.set_file_system(fs);
    subsystem
}

#[tokio::test]
async fn test_jailed_relative_paths_cannot_touch_home() {
    let env = common::setup_test_env();
    let subsystem = jailed_subsystem(&env).await;
    write(&subsystem, "/bob/a.txt", b"a").await;
    write(&subsystem, "/bob/b.txt", b"b").await;

    // without a leading separator these all land on the home itself
    assert!(matches!(
        subsystem.rename("a.txt", "c.txt").await,
        Err(FsError::HomeDirectory(_))
    ));
    assert!(matches!(
        subsystem.remove("a.txt").await,
        Err(FsError::HomeDirectory(_))
    ));
    assert!(matches!(
        subsystem.remove(".").await,
        Err(FsError::HomeDirectory(_))
    ));
    assert!(matches!(
        subsystem.make_directory("docs").await,
        Err(FsError::AlreadyExists(_))
    ));

    let names: Vec<String> = subsystem
        .list(".")
        .await
        .unwrap()
        .into_iter()
        .map(|entry| entry.name)
        .collect();
    assert_eq!(names, vec!["a.txt", "b.txt"]);
}

#[tokio::test]
async fn test_jailed_rename() {
    let env = common::setup_test_env();
    let subsystem = jailed_subsystem(&env).await;
    write(&subsystem, "/bob/a.txt", b"a").await;

    subsystem.rename("/bob/a.txt", "/bob/a.txt").await.unwrap();
    let stat = subsystem.stat("/bob/a.txt").await.unwrap();
    assert_eq!(stat[attributes::SIZE].as_size(), Some(1));

    subsystem.rename("/bob/a.txt", "/bob/c.txt").await.unwrap();
    assert!(subsystem.stat("/bob/c.txt").await.is_ok());
    assert!(matches!(
        subsystem.stat("/bob/a.txt").await,
        Err(FsError::NotFound(_))
    ));

    subsystem.make_directory("/bob/docs").await.unwrap();
    write(&subsystem, "/bob/docs/report.csv", b"x").await;
    assert!(matches!(
        subsystem.rename("/bob/docs", "/bob/docs/old").await,
        Err(FsError::InvalidMove { .. })
    ));
    assert!(subsystem.stat("/bob/docs/report.csv").await.is_ok());
}

#[tokio::test]
async fn test_unjailed_rename_onto_itself() {
    let env = common::setup_test_env();
    let session = common::session("bob");
    let fs = env
        .file_system_factory("{username}", "")
        .create_file_system(&session)
        .await
        .unwrap();
    let mut subsystem = env.subsystem_factory("{username}", "").create(session);
    subsystem.set_file_system(fs);
    write(&subsystem, "a.txt", b"a").await;

    // both name /bucket/bob/a.txt
    subsystem.rename("a.txt", "/a.txt").await.unwrap();
    assert!(subsystem.stat("a.txt").await.is_ok());
}

#[tokio::test]
async fn test_home_outside_jail_is_refused() {
    let env = common::setup_test_env();
    let factory = env.file_system_factory("jail", "jail2");
    let session = common::session("bob");
    let fs = factory.create_file_system(&session).await.unwrap();
    let mut subsystem = env.subsystem_factory("jail", "jail2").create(session);
    subsystem.set_file_system(fs);

    let err = subsystem.resolve_file(".").unwrap_err();
    assert!(matches!(err, FsError::JailMapping { .. }));
    assert_eq!(
        err.to_string(),
        "User directory is outside jailed path: jail2: jail"
    );
    assert!(subsystem.stat("/file").await.is_err());
}

#[tokio::test]
async fn test_set_attributes_drops_permissions() {
    let env = common::setup_test_env();
    let factory = env.file_system_factory("{username}", "");
    let session = common::session("bob");
    let fs = factory.create_file_system(&session).await.unwrap();
    common::write_file(&fs, "/bucket/bob/file", b"x").await;
    let mut subsystem = env.subsystem_factory("{username}", "").create(session);
    subsystem.set_file_system(fs);

    let mut only_permissions = AttributeMap::new();
    only_permissions.insert(
        PERMISSIONS.to_string(),
        AttributeValue::Permissions(PosixPermissions::from_mode(0o777)),
    );
    subsystem
        .set_attributes("file", only_permissions.clone())
        .await
        .unwrap();

    // anything else still reaches storage, which cannot hold it
    let mut with_time = only_permissions;
    with_time.insert(
        attributes::LAST_MODIFIED_TIME.to_string(),
        AttributeValue::Time(chrono::Utc::now()),
    );
    assert!(matches!(
        subsystem.set_attributes("file", with_time).await,
        Err(FsError::Unsupported(_))
    ));
}

#[tokio::test]
async fn test_no_filesystem_for_session() {
    let env = common::setup_test_env();
    let subsystem = env
        .subsystem_factory("{username}", "")
        .create(common::session("bob"));
    let err = subsystem.resolve_file(".").unwrap_err();
    assert!(matches!(err, FsError::FileSystemUnavailable(_)));
    assert_eq!(err.to_string(), "Error finding filesystem. (user: bob)");
}

#[tokio::test]
async fn test_cache_entry_lives_with_its_sessions() {
    let env = common::setup_test_env();
    let factory = env.file_system_factory("{username}", "");
    let session = common::session("bob");

    let first = factory.create_file_system(&session).await.unwrap();
    let second = factory.create_file_system(&session).await.unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert!(env.cache.resolve("bob").is_some());

    drop(first);
    assert!(env.cache.resolve("bob").is_some());
    drop(second);
    assert!(env.cache.resolve("bob").is_none());
    // the lookup already dropped the dead entry
    assert!(env.cache.is_empty());
    assert_eq!(env.cache.purge(), 0);

    // a later session gets a fresh filesystem
    let third = factory.create_file_system(&session).await.unwrap();
    assert!(Arc::ptr_eq(&env.cache.resolve("bob").unwrap(), &third));
}

#[tokio::test]
async fn test_users_get_separate_filesystems() {
    let env = common::setup_test_env();
    let factory = env.file_system_factory("{username}", "");
    let bob = factory
        .create_file_system(&common::session("bob"))
        .await
        .unwrap();
    let alice = factory
        .create_file_system(&common::session("alice"))
        .await
        .unwrap();
    assert!(!Arc::ptr_eq(&bob, &alice));
    assert_ne!(bob.key(), alice.key());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_sessions_share_one_filesystem() {
    let env = common::setup_test_env();
    let factory = Arc::new(env.file_system_factory("{username}", ""));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let factory = factory.clone();
            tokio::spawn(async move {
                factory
                    .create_file_system(&common::session("bob"))
                    .await
                    .unwrap()
            })
        })
        .collect();

    let mut filesystems = Vec::new();
    for handle in handles {
        filesystems.push(handle.await.unwrap());
    }
    for fs in &filesystems[1..] {
        assert!(Arc::ptr_eq(&filesystems[0], fs));
    }
}
