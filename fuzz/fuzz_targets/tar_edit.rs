//! Fuzz target for replacing the icon entry of arbitrary tar streams.
//!
//! Any stream the editor accepts must be rewritten without panicking, and
//! the rewritten stream must index again with exactly one icon entry.
//!
//! Run with: cargo +nightly fuzz run tar_edit

#![no_main]

use libfuzzer_sys::fuzz_target;
use std::io::Cursor;

use iconpack::tar::{TarEditor, TarIndex};
use iconpack::{EntryTime, ICON_ENTRY_NAME, NewEntry};

fuzz_target!(|data: &[u8]| {
    let Ok(mut editor) = TarEditor::open(Cursor::new(data.to_vec())) else {
        return;
    };

    while editor.delete_first(ICON_ENTRY_NAME).is_some() {}
    let icon = NewEntry::from_bytes(ICON_ENTRY_NAME, b"\x89PNG".to_vec()).mtime(EntryTime::Fixed(0));
    if editor.append(icon).is_err() {
        return;
    }

    let mut output = Vec::new();
    if editor.apply(&mut output).is_err() {
        return;
    }

    let index = TarIndex::scan(&mut Cursor::new(&output)).expect("rewritten stream must index");
    assert_eq!(index.count(ICON_ENTRY_NAME), 1);
});
