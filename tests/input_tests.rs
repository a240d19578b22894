use std::fs;
use std::path::PathBuf;

use pasal_verify::{enumerate_inputs, extract_citations, read_input, InputError};

#[test]
fn enumerate_inputs_finds_nested_memos() {
    let td = tempfile::tempdir().unwrap();
    let base = td.path();
    let dir = base.join("memos/2024");
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("b.txt"), "Pasal 55").unwrap();
    fs::write(dir.join("a.txt"), "Pasal 340 KUHP").unwrap();
    fs::write(dir.join("notes.md"), "ignored").unwrap();

    let pattern = format!("{}/memos/**/*.txt", base.display());
    let files = enumerate_inputs(&[pattern.clone(), pattern]).expect("should find files");
    let files: Vec<PathBuf> = files.into_iter().map(|p| p.strip_prefix(base).unwrap().to_path_buf()).collect();

    assert_eq!(files.len(), 2);
    assert_eq!(files[0].to_string_lossy(), "memos/2024/a.txt");
    assert_eq!(files[1].to_string_lossy(), "memos/2024/b.txt");
}

#[test]
fn enumerate_inputs_empty_is_an_error() {
    let td = tempfile::tempdir().unwrap();
    let pattern = format!("{}/memos/**/*.txt", td.path().display());
    let err = enumerate_inputs(&[pattern]).err().expect("should be error");
    assert!(matches!(err, InputError::NoFilesFound { .. }));
    assert!(err.to_string().starts_with("NoFilesFound"));
}

#[test]
fn read_input_tolerates_invalid_utf8() {
    let td = tempfile::tempdir().unwrap();
    let path = td.path().join("memo.txt");
    let mut bytes = b"Menurut Pasal 340 KUHP ".to_vec();
    bytes.extend_from_slice(&[0xff, 0xfe]);
    bytes.extend_from_slice(b" dan Pasal 55.");
    fs::write(&path, bytes).unwrap();

    let text = read_input(&path).expect("readable");
    let keys: Vec<String> = extract_citations(text.as_str()).iter().map(|k| k.to_string()).collect();
    assert_eq!(keys, vec!["Pasal 340 KUHP", "Pasal 55 KUHP"]);
}

#[test]
fn read_input_missing_file() {
    let td = tempfile::tempdir().unwrap();
    let err = read_input(&td.path().join("absent.txt")).unwrap_err();
    assert!(matches!(err, InputError::Read { .. }));
}

#[test]
fn plain_path_does_not_pick_up_same_named_files_below() {
    let td = tempfile::tempdir().unwrap();
    let base = td.path();
    fs::create_dir_all(base.join("old")).unwrap();
    fs::write(base.join("memo.txt"), "Pasal 340 KUHP").unwrap();
    fs::write(base.join("old/memo.txt"), "Pasal 55").unwrap();

    let files = enumerate_inputs(&[format!("{}/memo.txt", base.display())]).expect("file exists");
    assert_eq!(files, vec![base.join("memo.txt")]);

    let files = enumerate_inputs(&[format!("{}/*.txt", base.display())]).expect("top-level match");
    assert_eq!(files, vec![base.join("memo.txt")]);

    let files = enumerate_inputs(&[format!("{}/**/*.txt", base.display())]).expect("recursive match");
    assert_eq!(files.len(), 2);
}

#[test]
fn missing_plain_path_is_not_found() {
    let td = tempfile::tempdir().unwrap();
    let err = enumerate_inputs(&[format!("{}/absent.txt", td.path().display())]).unwrap_err();
    assert!(matches!(err, InputError::NoFilesFound { .. }));
}
