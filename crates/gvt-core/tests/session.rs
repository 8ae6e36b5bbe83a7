//! End-to-end session: build versions 0..7 and walk back through them.

use std::fs;
use std::path::Path;

use gvt_core::{GvtError, Repository, VersionId, VersionSummary};
use tempfile::tempdir;

fn touch(root: &Path, name: &str) {
    fs::write(root.join(name), "").unwrap();
}

fn read(root: &Path, name: &str) -> String {
    fs::read_to_string(root.join(name)).unwrap()
}

fn build_session(root: &Path) -> Repository {
    assert!(matches!(Repository::open(root), Err(GvtError::NotInitialized)));
    let repo = Repository::init(root).unwrap();

    touch(root, "a.txt");
    assert_eq!(repo.add("a.txt", None).unwrap(), VersionId(1));
    touch(root, "b.txt");
    assert_eq!(repo.add("b.txt", None).unwrap(), VersionId(2));
    assert!(repo.add("a.txt", None).unwrap_err().is_benign());

    touch(root, "c.txt");
    assert_eq!(repo.add("c.txt", Some("Adding C FILE")).unwrap(), VersionId(3));

    assert!(matches!(repo.detach("x", None), Err(GvtError::NotTracked(_))));
    assert_eq!(repo.detach("b.txt", None).unwrap(), VersionId(4));
    assert!(repo.detach("b.txt", None).unwrap_err().is_benign());
    assert_eq!(repo.add("b.txt", None).unwrap(), VersionId(5));

    assert!(matches!(
        repo.commit("d.txt", None),
        Err(GvtError::SourceFileMissing(_))
    ));
    touch(root, "d.txt");
    assert!(matches!(repo.commit("d.txt", None), Err(GvtError::NotTracked(_))));

    fs::write(root.join("b.txt"), "Ala ma kota").unwrap();
    assert_eq!(repo.commit("b.txt", None).unwrap(), VersionId(6));

    fs::write(root.join("b.txt"), "Ala ma kota\nPonownie!").unwrap();
    let message = "Again modified b.txt\nWith two lines!\nOr even three!";
    assert_eq!(repo.commit("b.txt", Some(message)).unwrap(), VersionId(7));

    repo
}

#[test]
fn session_versions_and_messages() {
    let dir = tempdir().unwrap();
    let repo = build_session(dir.path());

    assert_eq!(repo.latest().unwrap(), VersionId(7));
    assert_eq!(repo.active().unwrap(), VersionId(7));

    let info = repo.describe_version(None).unwrap();
    assert_eq!(info.id, VersionId(7));
    assert_eq!(
        info.message,
        "Again modified b.txt\nWith two lines!\nOr even three!"
    );

    let files: Vec<String> = repo.tracked_files(VersionId(7)).unwrap().into_iter().collect();
    assert_eq!(files, vec!["a.txt", "b.txt", "c.txt"]);
    let files: Vec<String> = repo.tracked_files(VersionId(4)).unwrap().into_iter().collect();
    assert_eq!(files, vec!["a.txt", "c.txt"]);
}

#[test]
fn session_history() {
    let dir = tempdir().unwrap();
    let repo = build_session(dir.path());

    let last_two: Vec<VersionSummary> = repo
        .history(Some(2))
        .unwrap()
        .map(|e| e.unwrap())
        .collect();
    assert_eq!(
        last_two,
        vec![
            VersionSummary {
                id: VersionId(7),
                summary: "Again modified b.txt".to_string(),
            },
            VersionSummary {
                id: VersionId(6),
                summary: "File committed successfully. File: b.txt".to_string(),
            },
        ]
    );

    let all: Vec<String> = repo
        .history(None)
        .unwrap()
        .map(|e| {
            let e = e.unwrap();
            format!("{}: {}", e.id, e.summary)
        })
        .collect();
    assert_eq!(
        all,
        vec![
            "7: Again modified b.txt",
            "6: File committed successfully. File: b.txt",
            "5: File added successfully. File: b.txt",
            "4: File detached successfully. File: b.txt",
            "3: Adding C FILE",
            "2: File added successfully. File: b.txt",
            "1: File added successfully. File: a.txt",
            "0: GVT initialized.",
        ]
    );
}

#[test]
fn session_checkout_back_and_forth() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    let repo = build_session(root);

    assert!(matches!(
        repo.checkout(VersionId(20)),
        Err(GvtError::NoSuchVersion(_))
    ));

    repo.checkout(VersionId(2)).unwrap();
    assert_eq!(read(root, "b.txt"), "");
    assert!(!root.join("c.txt").exists());
    assert_eq!(repo.describe_version(None).unwrap().id, VersionId(2));
    assert_eq!(repo.latest().unwrap(), VersionId(7));

    repo.checkout(VersionId(7)).unwrap();
    assert_eq!(read(root, "b.txt"), "Ala ma kota\nPonownie!");
    assert!(root.join("c.txt").exists());

    repo.checkout(VersionId(4)).unwrap();
    assert!(!root.join("b.txt").exists());
    assert!(root.join("a.txt").exists());

    // d.txt was never tracked, so no checkout touches it.
    assert!(root.join("d.txt").exists());
}
