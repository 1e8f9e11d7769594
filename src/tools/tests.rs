use super::*;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde_json::json;

fn call(name: &str, arguments: Value) -> ToolCall {
    ToolCall {
        id: format!("call_{name}"),
        name: name.into(),
        arguments,
    }
}

fn registry() -> (tempfile::TempDir, ToolRegistry) {
    let dir = tempfile::tempdir().unwrap();
    let registry = ToolRegistry::new(dir.path().to_path_buf());
    (dir, registry)
}

fn encode(text: &str) -> String {
    STANDARD.encode(text)
}

#[test]
fn test_definitions_cover_every_tool() {
    let (_dir, registry) = registry();
    let defs = registry.definitions();
    let names: Vec<&str> = defs.iter().map(|d| d.name.as_str()).collect();
    assert_eq!(
        names,
        ["read_file", "list_files", "edit_file", "write_encoded", "append_encoded"]
    );
    for def in &defs {
        assert_eq!(def.parameters["type"], "object");
        assert!(def.parameters["required"].as_array().unwrap().len() >= 1);
    }
}

#[test]
fn test_from_name_round_trips() {
    for kind in ToolKind::ALL {
        assert_eq!(ToolKind::from_name(kind.name()), Some(kind));
    }
    assert_eq!(ToolKind::from_name("bash"), None);
}

#[tokio::test]
async fn test_unknown_tool_is_error_result() {
    let (_dir, registry) = registry();
    let result = registry.dispatch(&call("rm_rf", json!({}))).await;
    assert!(result.is_error);
    assert_eq!(result.call_id, "call_rm_rf");
    assert_eq!(result.payload["error"], "tool_not_registered");
}

#[tokio::test]
async fn test_missing_argument_is_error_result() {
    let (_dir, registry) = registry();
    let result = registry
        .dispatch(&call("edit_file", json!({"path": "a.txt", "old_str": "x"})))
        .await;
    assert!(result.is_error);
    assert_eq!(result.payload["error"], "invalid_arguments");
    assert!(result.payload["message"].as_str().unwrap().contains("new_str"));
}

#[tokio::test]
async fn test_non_object_arguments_rejected() {
    let (_dir, registry) = registry();
    let result = registry.dispatch(&call("read_file", json!("a.txt"))).await;
    assert!(result.is_error);
    assert_eq!(result.payload["error"], "invalid_arguments");
}

#[tokio::test]
async fn test_read_file_relative_to_working_dir() {
    let (dir, registry) = registry();
    std::fs::write(dir.path().join("notes.md"), "# Notes\n").unwrap();

    let result = registry
        .dispatch(&call("read_file", json!({"path": "notes.md"})))
        .await;
    assert!(!result.is_error);
    assert_eq!(result.payload["content"], "# Notes\n");
    assert!(result.payload["file_path"]
        .as_str()
        .unwrap()
        .ends_with("notes.md"));
}

#[tokio::test]
async fn test_read_file_accepts_filename_alias() {
    let (dir, registry) = registry();
    std::fs::write(dir.path().join("a.txt"), "alpha").unwrap();
    let result = registry
        .dispatch(&call("read_file", json!({"filename": "a.txt"})))
        .await;
    assert_eq!(result.payload["content"], "alpha");
}

#[tokio::test]
async fn test_read_file_nonexistent() {
    let (_dir, registry) = registry();
    let result = registry
        .dispatch(&call("read_file", json!({"path": "nonexistent_file_xyz.txt"})))
        .await;
    assert!(result.is_error);
    assert_eq!(result.payload["error"], "not_found");
}

#[tokio::test]
async fn test_read_file_on_directory() {
    let (dir, registry) = registry();
    std::fs::create_dir(dir.path().join("sub")).unwrap();
    let result = registry
        .dispatch(&call("read_file", json!({"path": "sub"})))
        .await;
    assert_eq!(result.payload["error"], "not_a_file");
}

#[tokio::test]
async fn test_list_files_immediate_children_sorted() {
    let (dir, registry) = registry();
    std::fs::write(dir.path().join("b.txt"), "").unwrap();
    std::fs::create_dir_all(dir.path().join("a_dir/nested")).unwrap();
    std::fs::write(dir.path().join("a_dir/nested/deep.txt"), "").unwrap();

    let result = registry
        .dispatch(&call("list_files", json!({"path": "."})))
        .await;
    assert!(!result.is_error);
    assert_eq!(
        result.payload["files"],
        json!([
            {"filename": "a_dir", "type": "dir"},
            {"filename": "b.txt", "type": "file"},
        ])
    );
}

#[tokio::test]
async fn test_list_files_errors() {
    let (dir, registry) = registry();
    std::fs::write(dir.path().join("file.txt"), "").unwrap();

    let result = registry
        .dispatch(&call("list_files", json!({"path": "file.txt"})))
        .await;
    assert_eq!(result.payload["error"], "not_a_directory");

    let result = registry
        .dispatch(&call("list_files", json!({"path": "missing"})))
        .await;
    assert_eq!(result.payload["error"], "not_found");
}

#[tokio::test]
async fn test_edit_file_empty_old_creates_and_is_idempotent() {
    let (dir, registry) = registry();
    let args = json!({"path": "new/dir/file.txt", "old_str": "", "new_str": "content\n"});

    let first = registry.dispatch(&call("edit_file", args.clone())).await;
    assert_eq!(first.payload["action"], "created_file");
    let bytes_after_first = std::fs::read(dir.path().join("new/dir/file.txt")).unwrap();

    let second = registry.dispatch(&call("edit_file", args)).await;
    assert_eq!(second.payload["action"], "overwrote_file");
    let bytes_after_second = std::fs::read(dir.path().join("new/dir/file.txt")).unwrap();

    assert_eq!(bytes_after_first, b"content\n");
    assert_eq!(bytes_after_first, bytes_after_second);
}

#[tokio::test]
async fn test_edit_file_replaces_single_occurrence_span() {
    let (dir, registry) = registry();
    let path = dir.path().join("lib.rs");
    std::fs::write(&path, "fn old_name() {}\nfn other() {}\n").unwrap();

    let result = registry
        .dispatch(&call(
            "edit_file",
            json!({"path": "lib.rs", "old_str": "old_name", "new_str": "new_name"}),
        ))
        .await;
    assert_eq!(result.payload["action"], "edited");
    assert_eq!(result.payload["offset"], 3);
    assert_eq!(
        std::fs::read_to_string(&path).unwrap(),
        "fn new_name() {}\nfn other() {}\n"
    );
}

#[tokio::test]
async fn test_edit_file_only_first_occurrence_changes() {
    let (dir, registry) = registry();
    let path = dir.path().join("todo.txt");
    std::fs::write(&path, "a TODO b TODO c").unwrap();
    let edit = call(
        "edit_file",
        json!({"path": "todo.txt", "old_str": "TODO", "new_str": "DONE"}),
    );

    registry.dispatch(&edit).await;
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "a DONE b TODO c");

    registry.dispatch(&edit).await;
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "a DONE b DONE c");

    let third = registry.dispatch(&edit).await;
    assert!(!third.is_error);
    assert_eq!(third.payload["action"], edit_file::NOT_FOUND_ACTION);
}

#[tokio::test]
async fn test_edit_file_absent_old_leaves_bytes_identical() {
    let (dir, registry) = registry();
    let path = dir.path().join("keep.txt");
    std::fs::write(&path, "unchanged\r\n").unwrap();
    let before = std::fs::read(&path).unwrap();

    let result = registry
        .dispatch(&call(
            "edit_file",
            json!({"path": "keep.txt", "old_str": "missing", "new_str": "x"}),
        ))
        .await;
    assert!(!result.is_error);
    assert_eq!(result.payload["action"], "old_str not found");
    assert_eq!(std::fs::read(&path).unwrap(), before);
}

#[tokio::test]
async fn test_edit_file_missing_file_with_old_str() {
    let (_dir, registry) = registry();
    let result = registry
        .dispatch(&call(
            "edit_file",
            json!({"path": "ghost.txt", "old_str": "a", "new_str": "b"}),
        ))
        .await;
    assert_eq!(result.payload["error"], "not_found");
}

#[tokio::test]
async fn test_write_then_append_concatenates_decoded_fragments() {
    let (dir, registry) = registry();
    let path = dir.path().join("main.rs");

    let write = registry
        .dispatch(&call(
            "write_encoded",
            json!({"path": "main.rs", "content": encode("fn main() {\n")}),
        ))
        .await;
    assert_eq!(write.payload["action"], "written");

    for fragment in ["    println!(\"{}\", \"hi\");\n", "}\n"] {
        let append = registry
            .dispatch(&call(
                "append_encoded",
                json!({"path": "main.rs", "content": encode(fragment)}),
            ))
            .await;
        assert_eq!(append.payload["action"], "appended");
        assert_eq!(append.payload["bytes"], fragment.len());
    }

    assert_eq!(
        std::fs::read_to_string(&path).unwrap(),
        "fn main() {\n    println!(\"{}\", \"hi\");\n}\n"
    );
}

#[tokio::test]
async fn test_write_encoded_replaces_existing_content() {
    let (dir, registry) = registry();
    let path = dir.path().join("data.bin");
    std::fs::write(&path, "old old old").unwrap();

    registry
        .dispatch(&call(
            "write_encoded",
            json!({"path": "data.bin", "content": STANDARD.encode([0u8, 159, 146, 150])}),
        ))
        .await;
    assert_eq!(std::fs::read(&path).unwrap(), vec![0u8, 159, 146, 150]);
}

#[tokio::test]
async fn test_invalid_base64_is_encoding_error_and_file_untouched() {
    let (dir, registry) = registry();
    let path = dir.path().join("x.txt");
    std::fs::write(&path, "before").unwrap();

    for tool in ["write_encoded", "append_encoded"] {
        let result = registry
            .dispatch(&call(tool, json!({"path": "x.txt", "content": "not base64!!"})))
            .await;
        assert!(result.is_error);
        assert_eq!(result.payload["error"], "encoding_error");
    }
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "before");
}

#[tokio::test]
async fn test_append_encoded_requires_existing_file() {
    let (_dir, registry) = registry();
    let result = registry
        .dispatch(&call(
            "append_encoded",
            json!({"path": "nope.txt", "content": encode("x")}),
        ))
        .await;
    assert_eq!(result.payload["error"], "not_found");
}

#[test]
fn test_decode_tolerates_whitespace_and_missing_padding() {
    let wrapped = "SGVs\nbG8s\n IFdv\ncmxk";
    assert_eq!(
        write_encoded::decode_content(wrapped).unwrap(),
        b"Hello, World"
    );
    assert_eq!(write_encoded::decode_content("aGk").unwrap(), b"hi");
    assert_eq!(write_encoded::decode_content("aGk=").unwrap(), b"hi");
}

#[tokio::test]
async fn test_batch_results_keep_request_order() {
    let (dir, registry) = registry();
    std::fs::write(dir.path().join("one.txt"), "1").unwrap();

    let calls = vec![
        call("read_file", json!({"path": "one.txt"})),
        call("unknown", json!({})),
        call("list_files", json!({"path": "."})),
    ];
    let results = registry.dispatch_batch(&calls).await;
    let ids: Vec<&str> = results.iter().map(|r| r.call_id.as_str()).collect();
    assert_eq!(ids, ["call_read_file", "call_unknown", "call_list_files"]);
    assert_eq!(
        results.iter().map(|r| r.is_error).collect::<Vec<_>>(),
        [false, true, false]
    );
}

#[test]
fn test_result_message_carries_correlation_id() {
    let result = ToolResult::success("call_7", json!({"action": "edited"}));
    let msg = result.to_message();
    assert_eq!(msg.tool_call_id.as_deref(), Some("call_7"));
    assert_eq!(msg.text(), r#"{"action":"edited"}"#);
}

#[test]
fn test_text_protocol_preamble_lists_tools_and_shape() {
    let (_dir, registry) = registry();
    let preamble = text_protocol_preamble(&registry.definitions());
    for kind in ToolKind::ALL {
        assert!(preamble.contains(kind.name()));
    }
    assert!(preamble.contains("\"type\": \"function\""));
    assert!(preamble.contains("base64"));
}
