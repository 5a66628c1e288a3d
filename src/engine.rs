use crate::demo::DemoState;

/// Runs one simulation step: animation first, then world transforms.
pub fn update(state: &mut DemoState) {
    state.scene.early_update();
    state.update();
    state.scene.late_update();
}
