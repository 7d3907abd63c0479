//! Region table editor
//!
//! A [`TableEditor`] is bound to one region and turns table gestures (cell
//! edits, add/delete row, title rename, drag and drop) into [`ItemStore`]
//! mutations. Gesture state such as the title draft or the row being dragged
//! lives here and never reaches the store.
//!
//! Drag tracking uses item IDs rather than row indices so a drop after the
//! list changed underneath the drag cannot move the wrong row.

use uuid::Uuid;

use crate::clipboard::{self, Clipboard, ClipboardError};
use crate::export::{self, CsvExport};
use crate::grouping::region_items;
use crate::models::{ItemField, RequirementItem};
use crate::store::{ItemStore, StoreError};

/// Row currently being dragged and the row it hovers over
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DragState {
    pub source: Uuid,
    pub target: Option<Uuid>,
}

/// Result of committing the title editor
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TitleCommit {
    /// Not editing
    Idle,
    /// The region was renamed in the store
    Renamed { from: String, to: String },
    /// Draft was blank or unchanged; the original title is shown again
    Reverted,
}

/// Result of dropping a dragged row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropOutcome {
    Reordered,
    /// Dropped onto itself or nowhere
    Unchanged,
    /// Source or target vanished from the region during the drag
    Ignored,
}

/// A table gesture, as produced by a front end
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableAction {
    EditField {
        id: Uuid,
        field: ItemField,
        value: String,
    },
    AddRow,
    DeleteRow(Uuid),
    BeginRename,
    SetTitleDraft(String),
    CommitRename,
    CancelRename,
    DragStart(Uuid),
    DragOver(Uuid),
    Drop,
    CancelDrag,
}

/// What an applied [`TableAction`] did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableEvent {
    FieldUpdated(bool),
    RowAdded(Uuid),
    RowDeleted(bool),
    Title(TitleCommit),
    Dropped(DropOutcome),
    /// Only editor-local state changed
    StateChanged,
}

/// Controller for one region's table
#[derive(Debug, Clone)]
pub struct TableEditor {
    region: String,
    title_draft: Option<String>,
    drag: Option<DragState>,
}

impl TableEditor {
    pub fn new(region: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            title_draft: None,
            drag: None,
        }
    }

    /// The region this editor is bound to
    pub fn region(&self) -> &str {
        &self.region
    }

    /// The region's rows, in display order
    pub fn rows<'a>(&self, store: &'a ItemStore) -> Vec<&'a RequirementItem> {
        region_items(store.items(), &self.region)
    }

    // =========================================================================
    // Cells and rows
    // =========================================================================

    /// Commits an edited cell; only the five table columns are editable here
    pub fn edit_field(
        &self,
        store: &mut ItemStore,
        id: &Uuid,
        field: ItemField,
        value: impl Into<String>,
    ) -> bool {
        if !ItemField::COLUMNS.contains(&field) {
            return false;
        }
        store.update_field(id, field, value)
    }

    /// Appends a blank row to this region
    pub fn add_row(&self, store: &mut ItemStore) -> Uuid {
        store.add_item(&self.region)
    }

    /// Deletes a row belonging to this region
    pub fn delete_row(&self, store: &mut ItemStore, id: &Uuid) -> bool {
        let in_region = store
            .get(id)
            .is_some_and(|i| i.region_label() == self.region);
        in_region && store.delete_item(id).is_some()
    }

    // =========================================================================
    // Title
    // =========================================================================

    pub fn is_editing_title(&self) -> bool {
        self.title_draft.is_some()
    }

    /// The title to display: the draft while editing, else the region name
    pub fn title(&self) -> &str {
        self.title_draft.as_deref().unwrap_or(&self.region)
    }

    pub fn begin_title_edit(&mut self) {
        if self.title_draft.is_none() {
            self.title_draft = Some(self.region.clone());
        }
    }

    pub fn set_title_draft(&mut self, draft: impl Into<String>) {
        self.title_draft = Some(draft.into());
    }

    pub fn cancel_title_edit(&mut self) {
        self.title_draft = None;
    }

    /// Leaves title editing, renaming the region when the draft is a new,
    /// non-blank name
    pub fn commit_title(&mut self, store: &mut ItemStore) -> TitleCommit {
        let Some(draft) = self.title_draft.take() else {
            return TitleCommit::Idle;
        };

        let new_name = draft.trim();
        if new_name.is_empty() || new_name == self.region {
            return TitleCommit::Reverted;
        }

        let from = std::mem::replace(&mut self.region, new_name.to_string());
        store.rename_region(&from, new_name);
        TitleCommit::Renamed {
            from,
            to: new_name.to_string(),
        }
    }

    // =========================================================================
    // Drag and drop
    // =========================================================================

    pub fn drag_state(&self) -> Option<DragState> {
        self.drag
    }

    pub fn is_dragging(&self, id: &Uuid) -> bool {
        self.drag.is_some_and(|d| d.source == *id)
    }

    pub fn drag_start(&mut self, source: Uuid) {
        self.drag = Some(DragState {
            source,
            target: None,
        });
    }

    pub fn drag_over(&mut self, target: Uuid) {
        if let Some(drag) = self.drag.as_mut() {
            drag.target = Some(target);
        }
    }

    pub fn cancel_drag(&mut self) {
        self.drag = None;
    }

    /// Moves the dragged row to the hovered row's position
    ///
    /// The row is removed from its old position and reinserted at the target's
    /// index, then the whole region order is submitted to the store.
    pub fn drop_row(&mut self, store: &mut ItemStore) -> Result<DropOutcome, StoreError> {
        let Some(DragState { source, target }) = self.drag.take() else {
            return Ok(DropOutcome::Unchanged);
        };
        let Some(target) = target else {
            return Ok(DropOutcome::Unchanged);
        };
        if source == target {
            return Ok(DropOutcome::Unchanged);
        }

        let mut order: Vec<Uuid> = self.rows(store).iter().map(|i| i.id).collect();
        let (Some(from), Some(to)) = (
            order.iter().position(|id| *id == source),
            order.iter().position(|id| *id == target),
        ) else {
            log::debug!("Ignoring drop in '{}': row left the region", self.region);
            return Ok(DropOutcome::Ignored);
        };

        let moved = order.remove(from);
        order.insert(to, moved);
        store.reorder_region(&self.region, &order)?;
        Ok(DropOutcome::Reordered)
    }

    // =========================================================================
    // Export
    // =========================================================================

    /// CSV download of this region, `None` when it has no rows
    pub fn export_csv(&self, store: &ItemStore) -> Option<CsvExport> {
        export::export_region_csv(&self.region, self.rows(store))
    }

    /// Copies this region's rows as tab-separated text
    pub fn copy_text(
        &self,
        store: &ItemStore,
        clipboard: &mut dyn Clipboard,
    ) -> Result<bool, ClipboardError> {
        clipboard::copy_items(clipboard, self.rows(store))
    }

    /// Applies one gesture
    pub fn apply(
        &mut self,
        store: &mut ItemStore,
        action: TableAction,
    ) -> Result<TableEvent, StoreError> {
        let event = match action {
            TableAction::EditField { id, field, value } => {
                TableEvent::FieldUpdated(self.edit_field(store, &id, field, value))
            }
            TableAction::AddRow => TableEvent::RowAdded(self.add_row(store)),
            TableAction::DeleteRow(id) => TableEvent::RowDeleted(self.delete_row(store, &id)),
            TableAction::BeginRename => {
                self.begin_title_edit();
                TableEvent::StateChanged
            }
            TableAction::SetTitleDraft(draft) => {
                self.set_title_draft(draft);
                TableEvent::StateChanged
            }
            TableAction::CommitRename => TableEvent::Title(self.commit_title(store)),
            TableAction::CancelRename => {
                self.cancel_title_edit();
                TableEvent::StateChanged
            }
            TableAction::DragStart(id) => {
                self.drag_start(id);
                TableEvent::StateChanged
            }
            TableAction::DragOver(id) => {
                self.drag_over(id);
                TableEvent::StateChanged
            }
            TableAction::Drop => TableEvent::Dropped(self.drop_row(store)?),
            TableAction::CancelDrag => {
                self.cancel_drag();
                TableEvent::StateChanged
            }
        };
        Ok(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clipboard::MemoryClipboard;
    use crate::grouping::group_by_region;

    struct Fixture {
        store: ItemStore,
        login: Uuid,
        search: Uuid,
        logout: Uuid,
        help: Uuid,
    }

    fn fixture() -> Fixture {
        let login = RequirementItem::new("Nav", "Login");
        let search = RequirementItem::new("List", "Search");
        let logout = RequirementItem::new("Nav", "Logout");
        let help = RequirementItem::new("Nav", "Help");
        let mut f = Fixture {
            store: ItemStore::new(),
            login: login.id,
            search: search.id,
            logout: logout.id,
            help: help.id,
        };
        f.store.replace_all(vec![login, search, logout, help]);
        f
    }

    fn ids(rows: Vec<&RequirementItem>) -> Vec<Uuid> {
        rows.into_iter().map(|i| i.id).collect()
    }

    #[test]
    fn test_edit_field() {
        let mut f = fixture();
        let editor = TableEditor::new("Nav");
        assert!(editor.edit_field(&mut f.store, &f.login, ItemField::Interaction, "click"));
        assert_eq!(f.store.get(&f.login).unwrap().interaction, "click");
    }

    #[test]
    fn test_edit_field_rejects_region_column() {
        let mut f = fixture();
        let editor = TableEditor::new("Nav");
        assert!(!editor.edit_field(&mut f.store, &f.login, ItemField::Region, "List"));
        assert_eq!(f.store.get(&f.login).unwrap().region, "Nav");
    }

    #[test]
    fn test_add_row_lands_at_region_end() {
        let mut f = fixture();
        let editor = TableEditor::new("List");
        let id = editor.add_row(&mut f.store);
        assert_eq!(ids(editor.rows(&f.store)), vec![f.search, id]);
    }

    #[test]
    fn test_delete_row_only_in_own_region() {
        let mut f = fixture();
        let editor = TableEditor::new("Nav");
        assert!(!editor.delete_row(&mut f.store, &f.search));
        assert!(editor.delete_row(&mut f.store, &f.logout));
        assert_eq!(ids(editor.rows(&f.store)), vec![f.login, f.help]);
    }

    #[test]
    fn test_rename_commit() {
        let mut f = fixture();
        let mut editor = TableEditor::new("Nav");
        editor.begin_title_edit();
        assert_eq!(editor.title(), "Nav");
        editor.set_title_draft("  Header ");

        let commit = editor.commit_title(&mut f.store);
        assert_eq!(
            commit,
            TitleCommit::Renamed {
                from: "Nav".to_string(),
                to: "Header".to_string()
            }
        );
        assert_eq!(editor.region(), "Header");
        assert!(!editor.is_editing_title());
        assert_eq!(editor.rows(&f.store).len(), 3);
    }

    #[test]
    fn test_rename_into_existing_region_merges() {
        let mut f = fixture();
        let mut editor = TableEditor::new("List");
        editor.begin_title_edit();
        editor.set_title_draft("Nav");

        assert_eq!(
            editor.commit_title(&mut f.store),
            TitleCommit::Renamed {
                from: "List".to_string(),
                to: "Nav".to_string()
            }
        );

        let groups = group_by_region(f.store.items());
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].name, "Nav");
        let merged: Vec<Uuid> = groups[0].items.iter().map(|i| i.id).collect();
        assert_eq!(merged, vec![f.login, f.search, f.logout, f.help]);
        assert_eq!(ids(editor.rows(&f.store)), merged);
    }

    #[test]
    fn test_blank_rename_reverts() {
        let mut f = fixture();
        let mut editor = TableEditor::new("Nav");
        let version = f.store.version();
        editor.begin_title_edit();
        editor.set_title_draft("   ");

        assert_eq!(editor.commit_title(&mut f.store), TitleCommit::Reverted);
        assert_eq!(editor.title(), "Nav");
        assert_eq!(f.store.version(), version);
    }

    #[test]
    fn test_unchanged_rename_reverts() {
        let mut f = fixture();
        let mut editor = TableEditor::new("Nav");
        editor.begin_title_edit();
        assert_eq!(editor.commit_title(&mut f.store), TitleCommit::Reverted);
        assert_eq!(editor.commit_title(&mut f.store), TitleCommit::Idle);
    }

    #[test]
    fn test_drag_down() {
        let mut f = fixture();
        let mut editor = TableEditor::new("Nav");
        editor.drag_start(f.login);
        editor.drag_over(f.help);

        assert_eq!(editor.drop_row(&mut f.store), Ok(DropOutcome::Reordered));
        assert_eq!(ids(editor.rows(&f.store)), vec![f.logout, f.help, f.login]);
        assert!(editor.drag_state().is_none());

        let groups = group_by_region(f.store.items());
        assert_eq!(groups[0].name, "Nav");
        assert_eq!(groups[1].items[0].id, f.search);
    }

    #[test]
    fn test_drag_up() {
        let mut f = fixture();
        let mut editor = TableEditor::new("Nav");
        editor.drag_start(f.help);
        editor.drag_over(f.login);

        assert_eq!(editor.drop_row(&mut f.store), Ok(DropOutcome::Reordered));
        assert_eq!(ids(editor.rows(&f.store)), vec![f.help, f.login, f.logout]);
    }

    #[test]
    fn test_drop_without_target_is_unchanged() {
        let mut f = fixture();
        let mut editor = TableEditor::new("Nav");
        editor.drag_start(f.login);
        assert_eq!(editor.drop_row(&mut f.store), Ok(DropOutcome::Unchanged));

        editor.drag_start(f.login);
        editor.drag_over(f.login);
        assert_eq!(editor.drop_row(&mut f.store), Ok(DropOutcome::Unchanged));
    }

    #[test]
    fn test_drop_after_row_deleted_is_ignored() {
        let mut f = fixture();
        let mut editor = TableEditor::new("Nav");
        editor.drag_start(f.login);
        editor.drag_over(f.help);
        f.store.delete_item(&f.help);

        let before = f.store.items().to_vec();
        assert_eq!(editor.drop_row(&mut f.store), Ok(DropOutcome::Ignored));
        assert_eq!(f.store.items(), before.as_slice());
    }

    #[test]
    fn test_cross_region_drop_is_ignored() {
        let mut f = fixture();
        let mut editor = TableEditor::new("Nav");
        editor.drag_start(f.login);
        editor.drag_over(f.search);
        assert_eq!(editor.drop_row(&mut f.store), Ok(DropOutcome::Ignored));
    }

    #[test]
    fn test_apply_actions() {
        let mut f = fixture();
        let mut editor = TableEditor::new("List");

        let event = editor.apply(&mut f.store, TableAction::AddRow).unwrap();
        let TableEvent::RowAdded(new_id) = event else {
            panic!("Expected RowAdded, got {:?}", event);
        };

        editor
            .apply(
                &mut f.store,
                TableAction::EditField {
                    id: new_id,
                    field: ItemField::FunctionName,
                    value: "Export".to_string(),
                },
            )
            .unwrap();
        editor.apply(&mut f.store, TableAction::DragStart(new_id)).unwrap();
        editor.apply(&mut f.store, TableAction::DragOver(f.search)).unwrap();
        let dropped = editor.apply(&mut f.store, TableAction::Drop).unwrap();

        assert_eq!(dropped, TableEvent::Dropped(DropOutcome::Reordered));
        assert_eq!(ids(editor.rows(&f.store)), vec![new_id, f.search]);
        assert_eq!(f.store.get(&new_id).unwrap().function_name, "Export");
    }

    #[test]
    fn test_export_and_copy() {
        let f = fixture();
        let editor = TableEditor::new("List");

        let export = editor.export_csv(&f.store).unwrap();
        assert_eq!(export.file_name, "List_requirements.csv");
        assert!(export.content.contains("\"Search\""));

        let mut clipboard = MemoryClipboard::new();
        assert_eq!(editor.copy_text(&f.store, &mut clipboard), Ok(true));
        assert!(clipboard.contents.unwrap().contains("Search"));

        let empty = TableEditor::new("Footer");
        assert!(empty.export_csv(&f.store).is_none());
    }
}
