use super::Workbench;
use crate::kernel::Action;

impl Workbench {
    /// Reduces one action and hands its effects to the runtime.
    pub fn dispatch(&mut self, action: Action) -> bool {
        let result = self.core.dispatch(action);
        for effect in result.effects {
            tracing::trace!(?effect, "run effect");
            self.runner.run(effect);
        }
        self.sync_file_watcher();
        result.state_changed
    }

    fn sync_file_watcher(&mut self) {
        if let Some(watcher) = self.watcher.as_mut() {
            watcher.sync_open_files(self.core.files().paths());
        }
    }
}
