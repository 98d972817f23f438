#![allow(dead_code)]

use std::path::Path;

use crushcheck::commands::init_command;
use crushcheck_core::workspace::WorkspaceLayout;

pub const REFERENCE_CSV: &str = "\
Drug,Can be Crushed,Alternative form available?,Recommendation
Paracetamol,Yes,None,Safe to crush
Aspirin EC,No,Dispersible tablet,Do not crush; use dispersible
Omeprazole MR,No,Oral suspension,Open capsule; do not crush pellets
";

/// Initialize a workspace at `root` and drop the reference CSV into `data/`.
pub fn init_with_reference(root: &Path) -> WorkspaceLayout {
    init_command(&root.to_string_lossy(), Some("TestWard".into())).expect("init");
    let layout = WorkspaceLayout::new(root);
    std::fs::write(layout.data_dir.join("Crush_Med_Data_Bank_Clean.csv"), REFERENCE_CSV)
        .expect("write reference");
    layout
}
