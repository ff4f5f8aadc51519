use kurbo::Rect;
use log::{debug, info};

use super::RichEditor;
use crate::host::DirtyFlag;
use crate::services::CopyOptions;

/// Entries offered by the selection menu.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct SelectMenuInfo {
    pub show_copy: bool,
    pub show_cut: bool,
    pub show_copy_all: bool,
    pub show_paste: bool,
    pub menu_is_show: bool,
}

/// What the select overlay currently shows: both handles, in root
/// coordinates, and the menu.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct SelectOverlayInfo {
    pub first_handle: Rect,
    pub second_handle: Rect,
    pub menu: SelectMenuInfo,
}

#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct OverlayState {
    visible: bool,
    info: SelectOverlayInfo,
}

impl RichEditor {
    /// Shows the overlay for the current selection, or refreshes it when it
    /// is already up. The paste entry follows the last clipboard answer and
    /// is refreshed once the clipboard replies.
    pub fn show_select_overlay(&mut self) {
        self.calculate_handle_offset();
        self.check_clipboard_has_data();
        self.update_select_menu_info();
        if !self.overlay.visible {
            info!("select overlay shown");
        }
        self.overlay.visible = true;
        self.mark_dirty(DirtyFlag::Render);
    }

    pub fn close_select_overlay(&mut self) {
        if !self.overlay.visible {
            return;
        }
        info!("select overlay closed");
        self.overlay.visible = false;
        self.mark_dirty(DirtyFlag::Render);
    }

    pub fn is_select_overlay_on(&self) -> bool {
        self.overlay.visible
    }

    pub fn select_overlay(&self) -> Option<&SelectOverlayInfo> {
        self.overlay.visible.then_some(&self.overlay.info)
    }

    pub(crate) fn update_select_menu_info(&mut self) {
        let len = self.store.text_len();
        let has_value = len > 0;
        let has_data = self.clipboard_has_data == Some(true);
        let copyable = self.config.copy_options != CopyOptions::None
            && has_value
            && self.selector.is_selected();
        let select_all = self.selector.is_valid()
            && self.selector.text_start() == 0
            && self.selector.text_end() == len;
        let menu = SelectMenuInfo {
            show_copy: copyable,
            show_cut: copyable,
            show_copy_all: !select_all && has_value,
            show_paste: has_data,
            menu_is_show: has_value || has_data,
        };
        debug!("select menu {menu:?}");
        self.overlay.info = SelectOverlayInfo {
            first_handle: self.selector.first_handle,
            second_handle: self.selector.second_handle,
            menu,
        };
    }
}
