// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn parse(name: &str, content: &str) -> Result<AgentDefinition, DefinitionError> {
    AgentDefinition::parse(Path::new(name), content)
}

#[test]
fn parses_full_header_and_body() {
    let def = parse(
        "agents/Code Reviewer.md",
        "---\n\
         type: interactive-subprocess\n\
         description: Reviews diffs\n\
         listen:\n  - file.modify\n  - review.request\n\
         ignore_self: false\n\
         emits:\n  - review.done\n\
         allowed_tools:\n  - Read\n  - Grep\n\
         model: opus\n\
         effort: high\n\
         ---\n\
         Look at the change and comment.\n",
    )
    .unwrap();

    assert_eq!(def.id, "code-reviewer");
    assert_eq!(def.kind, AgentKind::InteractiveSubprocess);
    assert_eq!(def.description, "Reviews diffs");
    assert_eq!(def.listen, vec!["file.modify", "review.request"]);
    assert!(!def.ignore_self);
    assert_eq!(def.emits, vec!["review.done"]);
    assert_eq!(def.allowed_tools, Some(vec!["Read".to_string(), "Grep".to_string()]));
    assert_eq!(def.model.as_deref(), Some("opus"));
    assert_eq!(def.effort.as_deref(), Some("high"));
    assert_eq!(def.body, "Look at the change and comment.\n");
}

#[test]
fn defaults_apply_when_header_is_sparse() {
    let def = parse("notify.md", "---\ntype: shell-template\n---\necho hi\n").unwrap();
    assert_eq!(def.kind, AgentKind::ShellTemplate);
    assert_eq!(def.description, "");
    assert!(def.listen.is_empty());
    assert!(def.ignore_self);
    assert!(def.emits.is_empty());
    assert!(def.allowed_tools.is_none());
    assert_eq!(def.body, "echo hi\n");
}

#[test]
fn empty_header_block_is_all_defaults() {
    let def = parse("demo.md", "---\n---\nbody text").unwrap();
    assert_eq!(def.kind, AgentKind::InteractiveSubprocess);
    assert!(def.ignore_self);
    assert_eq!(def.body, "body text");
}

#[test]
fn unknown_header_keys_are_ignored() {
    let def = parse("demo.md", "---\nlisten: [\"t.*\"]\ncolor: teal\n---\nbody").unwrap();
    assert_eq!(def.listen, vec!["t.*"]);
}

#[test]
fn body_is_verbatim_including_delimiters_inside() {
    let def = parse("demo.md", "---\n---\nfirst\n---\nsecond\n").unwrap();
    assert_eq!(def.body, "first\n---\nsecond\n");
}

#[test]
fn missing_header_is_rejected() {
    let err = parse("demo.md", "just a prompt with no header\n").unwrap_err();
    assert!(matches!(err, DefinitionError::MissingHeader));

    let err = parse("demo.md", "---\nnever closed\n").unwrap_err();
    assert!(matches!(err, DefinitionError::MissingHeader));
}

#[test]
fn malformed_yaml_is_rejected() {
    let err = parse("demo.md", "---\nlisten: [unclosed\n---\nbody").unwrap_err();
    assert!(matches!(err, DefinitionError::Header(_)));
}

#[test]
fn unslugifiable_name_is_rejected() {
    let err = parse("!!!.md", "---\n---\nbody").unwrap_err();
    assert!(matches!(err, DefinitionError::EmptyId));
}

#[test]
fn bad_kind_is_rejected() {
    let err = parse("demo.md", "---\ntype: cron\n---\nbody").unwrap_err();
    assert!(matches!(err, DefinitionError::Header(_)));
}
