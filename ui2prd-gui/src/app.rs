use eframe::egui;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use uuid::Uuid;

use ui2prd_core::credentials::{self, KeyValueStore, MemoryKeyValueStore};
use ui2prd_core::{
    AnalysisJob, Analyzer, AppConfig, BeginError, Clipboard, Completion, DropOutcome,
    FileKeyValueStore, GeminiClient, ImagePayload, ItemField, LazyClipboard, Notice,
    RegionSnapshot, RegionViewCache, RequirementItem, Session, Severity, TableAction,
    TableEditor, TableEvent, TitleCommit,
};

/// How long the "copied" indicator stays visible
const COPIED_INDICATOR: Duration = Duration::from_secs(2);

/// Repaint interval while an analysis is running
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Fonts with CJK glyphs tried when none is configured
const CJK_FONT_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/opentype/noto/NotoSansCJK-Regular.ttc",
    "/usr/share/fonts/noto-cjk/NotoSansCJK-Regular.ttc",
    "/usr/share/fonts/google-noto-cjk/NotoSansCJK-Regular.ttc",
    "/usr/share/fonts/truetype/wqy/wqy-microhei.ttc",
    "/System/Library/Fonts/PingFang.ttc",
    "/System/Library/Fonts/STHeiti Light.ttc",
    "C:\\Windows\\Fonts\\msyh.ttc",
    "C:\\Windows\\Fonts\\simhei.ttf",
];

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp"];

/// Region-level requests that need more than the store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RegionCommand {
    Copy,
    ExportCsv,
}

pub struct Ui2PrdApp {
    config: AppConfig,
    session: Session,
    analyzer: Option<Analyzer>,
    job: Option<AnalysisJob>,
    key_store: Box<dyn KeyValueStore>,
    clipboard: LazyClipboard,

    // Table state
    view: RegionViewCache,
    editors: HashMap<String, TableEditor>,
    focus_title: Option<String>,
    copied: Option<(String, Instant)>,

    // Screenshot preview (uri, bytes)
    preview: Option<(String, Arc<[u8]>)>,
    show_preview: bool,

    // API key dialog
    show_key_dialog: bool,
    key_input: String,
    key_visible: bool,
    key_status: String,
}

impl Ui2PrdApp {
    pub fn new(cc: &eframe::CreationContext<'_>, config: AppConfig) -> Self {
        egui_extras::install_image_loaders(&cc.egui_ctx);
        Self::configure_fonts(&cc.egui_ctx, config.cjk_font.as_deref());

        let analyzer = match GeminiClient::from_config(&config) {
            Ok(client) => Some(Analyzer::new(Arc::new(client))),
            Err(e) => {
                log::error!("Failed to create AI client: {}", e);
                None
            }
        };

        let key_store: Box<dyn KeyValueStore> = match FileKeyValueStore::open_default() {
            Ok(store) => Box::new(store),
            Err(e) => {
                log::warn!("{}; API keys will only be kept for this session", e);
                Box::new(MemoryKeyValueStore::new())
            }
        };

        Self {
            config,
            session: Session::new(),
            analyzer,
            job: None,
            key_store,
            clipboard: LazyClipboard::system(),
            view: RegionViewCache::new(),
            editors: HashMap::new(),
            focus_title: None,
            copied: None,
            preview: None,
            show_preview: false,
            show_key_dialog: false,
            key_input: String::new(),
            key_visible: false,
            key_status: String::new(),
        }
    }

    /// Adds a font with CJK glyphs as a fallback so region names and
    /// column headers render
    fn configure_fonts(ctx: &egui::Context, configured: Option<&Path>) {
        let candidates = configured
            .map(Path::to_path_buf)
            .into_iter()
            .chain(CJK_FONT_CANDIDATES.iter().map(PathBuf::from));

        let Some((path, bytes)) = candidates
            .filter_map(|p| fs::read(&p).ok().map(|bytes| (p, bytes)))
            .next()
        else {
            log::warn!("No CJK font found; set cjk_font in the config file");
            return;
        };

        let mut fonts = egui::FontDefinitions::default();
        fonts.font_data.insert(
            "cjk".to_owned(),
            egui::FontData::from_owned(bytes).into(),
        );
        for family in [egui::FontFamily::Proportional, egui::FontFamily::Monospace] {
            fonts
                .families
                .entry(family)
                .or_default()
                .push("cjk".to_owned());
        }
        ctx.set_fonts(fonts);
        log::info!("Using CJK font {}", path.display());
    }

    // =========================================================================
    // Screenshot
    // =========================================================================

    fn pick_image(&mut self, ctx: &egui::Context) {
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("Images", IMAGE_EXTENSIONS)
            .pick_file()
        {
            self.load_image_from_path(ctx, &path);
        }
    }

    fn load_image_from_path(&mut self, ctx: &egui::Context, path: &Path) {
        match ImagePayload::from_path(path, self.config.max_image_bytes) {
            Ok(image) => self.install_image(ctx, image),
            Err(e) => self.session.reject_image(&e),
        }
    }

    fn install_image(&mut self, ctx: &egui::Context, image: ImagePayload) {
        self.forget_preview(ctx);
        self.editors.clear();
        self.copied = None;
        self.session.load_image(image);

        if let Some(image) = self.session.image() {
            let uri = format!(
                "bytes://screenshot-{}.{}",
                self.session.generation(),
                image.format().extension()
            );
            self.preview = Some((uri, Arc::from(image.bytes())));
        }
    }

    fn forget_preview(&mut self, ctx: &egui::Context) {
        if let Some((uri, _)) = self.preview.take() {
            ctx.forget_image(&uri);
        }
        self.show_preview = false;
    }

    fn clear(&mut self, ctx: &egui::Context) {
        self.forget_preview(ctx);
        self.editors.clear();
        self.copied = None;
        self.session.clear();
    }

    fn handle_dropped_files(&mut self, ctx: &egui::Context) {
        let dropped = ctx.input(|i| i.raw.dropped_files.clone());
        let Some(file) = dropped.into_iter().next() else {
            return;
        };

        if let Some(path) = &file.path {
            self.load_image_from_path(ctx, path);
        } else if let Some(bytes) = &file.bytes {
            match ImagePayload::from_bytes(bytes.to_vec(), self.config.max_image_bytes) {
                Ok(image) => self.install_image(ctx, image),
                Err(e) => self.session.reject_image(&e),
            }
        }
    }

    // =========================================================================
    // Analysis
    // =========================================================================

    fn start_analysis(&mut self) {
        let Some(analyzer) = self.analyzer.clone() else {
            self.session.set_notice(Notice::AnalysisFailed(
                "AI client is unavailable".to_string(),
            ));
            return;
        };

        let api_key = match credentials::resolve_api_key_from_env(&*self.key_store) {
            Ok(key) => key.map(|k| k.value),
            Err(e) => {
                log::warn!("{}", e);
                None
            }
        };

        match self.session.start_analysis(&analyzer, api_key) {
            Ok(job) => self.job = Some(job),
            Err(BeginError::MissingCredential) => self.open_key_dialog(),
            Err(e) => log::debug!("Analysis not started: {}", e),
        }
    }

    fn poll_job(&mut self, ctx: &egui::Context) {
        let Some(job) = self.job.as_mut() else {
            return;
        };
        let Some(result) = job.try_finish() else {
            ctx.request_repaint_after(POLL_INTERVAL);
            return;
        };
        let generation = job.generation();
        self.job = None;

        match self.session.finish_analysis(generation, result) {
            Completion::Applied(count) => {
                self.editors.clear();
                self.session
                    .set_notice(Notice::Info(format!("Extracted {} requirements", count)));
            }
            Completion::Failed => {
                if self.session.notice().is_some_and(Notice::wants_credential) {
                    self.open_key_dialog();
                }
            }
            Completion::Stale => {}
        }
    }

    // =========================================================================
    // Region tables
    // =========================================================================

    /// Keeps one editor per displayed region, re-keying editors whose region
    /// was renamed
    fn sync_editors(&mut self, groups: &[RegionSnapshot]) {
        let mut previous: HashMap<String, TableEditor> = self
            .editors
            .drain()
            .map(|(_, editor)| (editor.region().to_string(), editor))
            .collect();

        self.editors = groups
            .iter()
            .map(|group| {
                let editor = previous
                    .remove(&group.name)
                    .unwrap_or_else(|| TableEditor::new(group.name.clone()));
                (group.name.clone(), editor)
            })
            .collect();
    }

    fn apply_actions(&mut self, actions: Vec<(String, TableAction)>) {
        for (region, action) in actions {
            let Some(editor) = self.editors.get_mut(&region) else {
                continue;
            };

            match editor.apply(self.session.store_mut(), action) {
                Ok(TableEvent::Title(TitleCommit::Renamed { from, to })) => {
                    log::info!("Renamed region '{}' to '{}'", from, to);
                }
                Ok(TableEvent::Dropped(DropOutcome::Ignored)) => {
                    log::debug!("Drop in '{}' ignored", region);
                }
                Ok(_) => {}
                Err(e) => self.session.report_store_error(&e),
            }
        }
    }

    fn copy_region(&mut self, region: &str) {
        let Some(editor) = self.editors.get(region) else {
            return;
        };

        match editor.copy_text(self.session.store(), &mut self.clipboard) {
            Ok(true) => self.copied = Some((region.to_string(), Instant::now())),
            Ok(false) => {}
            Err(e) => self.session.report_clipboard_error(&e),
        }
    }

    fn export_region(&mut self, region: &str) {
        let Some(csv) = self
            .editors
            .get(region)
            .and_then(|editor| editor.export_csv(self.session.store()))
        else {
            return;
        };

        let Some(path) = rfd::FileDialog::new()
            .set_file_name(&csv.file_name)
            .add_filter("CSV", &["csv"])
            .save_file()
        else {
            return;
        };

        match fs::write(&path, csv.as_bytes()) {
            Ok(()) => {
                log::info!("Exported CSV: {}", path.display());
                self.session
                    .set_notice(Notice::Info(format!("Saved {}", path.display())));
            }
            Err(e) => self
                .session
                .set_notice(Notice::ExportFailed(format!("{}: {}", path.display(), e))),
        }
    }

    // =========================================================================
    // API key
    // =========================================================================

    fn open_key_dialog(&mut self) {
        self.key_input = credentials::stored_api_key(&*self.key_store)
            .ok()
            .flatten()
            .unwrap_or_default();
        self.key_visible = false;
        self.key_status = self.current_key_status();
        self.show_key_dialog = true;
    }

    /// One-line description of the key analysis would use
    fn current_key_status(&self) -> String {
        match credentials::resolve_api_key_from_env(&*self.key_store) {
            Ok(Some(key)) => format!("Current key: {}", key.summary()),
            Ok(None) => "No API key configured".to_string(),
            Err(e) => format!("Could not read saved key: {}", e),
        }
    }

    fn save_key(&mut self) -> bool {
        match credentials::save_api_key(&mut *self.key_store, &self.key_input) {
            Ok(()) => {
                let message = if self.key_input.trim().is_empty() {
                    "Saved API key removed"
                } else {
                    "API key saved"
                };
                self.session.set_notice(Notice::Info(message.to_string()));
                true
            }
            Err(e) => {
                self.session.set_notice(Notice::KeyNotSaved(e.to_string()));
                false
            }
        }
    }

    // =========================================================================
    // Panels
    // =========================================================================

    fn show_top_panel(&mut self, ctx: &egui::Context) {
        let mut open = false;
        let mut analyze = false;
        let mut clear = false;
        let mut key = false;

        egui::TopBottomPanel::top("top_panel").show(ctx, |ui| {
            egui::menu::bar(ui, |ui| {
                if ui.button("📂 Open Screenshot...").clicked() {
                    open = true;
                }

                let can_analyze = self.session.image().is_some() && !self.session.is_busy();
                if ui
                    .add_enabled(can_analyze, egui::Button::new("🔍 Analyze"))
                    .clicked()
                {
                    analyze = true;
                }
                if self.session.is_busy() {
                    ui.spinner();
                    ui.label("Analyzing...");
                }

                let has_content =
                    self.session.image().is_some() || !self.session.store().is_empty();
                if ui
                    .add_enabled(has_content, egui::Button::new("🗑 Clear"))
                    .clicked()
                {
                    clear = true;
                }

                ui.separator();
                ui.label(format!("Requirements: {}", self.session.store().len()));

                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui.button("🔑 API Key").clicked() {
                        key = true;
                    }
                });
            });
        });

        if open {
            self.pick_image(ctx);
        }
        if analyze {
            self.start_analysis();
        }
        if clear {
            self.clear(ctx);
        }
        if key {
            self.open_key_dialog();
        }
    }

    fn show_notice_bar(&mut self, ctx: &egui::Context) {
        let Some(notice) = self.session.notice().cloned() else {
            return;
        };
        let mut dismiss = false;
        let mut enter_key = false;

        egui::TopBottomPanel::top("notice_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                let color = match notice.severity() {
                    Severity::Error => egui::Color32::RED,
                    Severity::Warning => egui::Color32::from_rgb(230, 160, 0),
                    Severity::Info => egui::Color32::GREEN,
                };
                ui.colored_label(color, notice.message());

                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui.small_button("✖").on_hover_text("Dismiss").clicked() {
                        dismiss = true;
                    }
                    if notice.wants_credential() && ui.button("Enter API Key").clicked() {
                        enter_key = true;
                    }
                });
            });
        });

        if dismiss {
            self.session.dismiss_notice();
        }
        if enter_key {
            self.open_key_dialog();
        }
    }

    fn show_image_panel(&mut self, ctx: &egui::Context) {
        let mut copy_data_url = false;
        egui::SidePanel::left("image_panel")
            .resizable(true)
            .default_width(320.0)
            .show(ctx, |ui| {
                ui.heading("Screenshot");
                ui.add_space(6.0);

                let Some((uri, bytes)) = &self.preview else {
                    ui.label("Open a PNG, JPEG or WEBP screenshot, or drop one onto the window.");
                    return;
                };

                let image = egui::Image::from_bytes(uri.clone(), bytes.clone())
                    .max_width(ui.available_width())
                    .sense(egui::Sense::click());
                let response = ui.add(image).on_hover_text("Click to enlarge");
                if response.clicked() {
                    self.show_preview = true;
                }
                response.context_menu(|ui| {
                    if ui.button("📋 Copy as data URL").clicked() {
                        copy_data_url = true;
                        ui.close_menu();
                    }
                });

                if let Some(image) = self.session.image() {
                    ui.label(
                        egui::RichText::new(format!(
                            "{} · {:.1} KB",
                            image.format(),
                            image.len() as f64 / 1024.0
                        ))
                        .small()
                        .color(egui::Color32::GRAY),
                    );
                }
            });

        if copy_data_url {
            self.copy_image_data_url();
        }
    }

    fn copy_image_data_url(&mut self) {
        let Some(image) = self.session.image() else {
            return;
        };
        let url = image.to_data_url();
        match self.clipboard.set_text(&url) {
            Ok(()) => self
                .session
                .set_notice(Notice::Info("Screenshot copied as data URL".to_string())),
            Err(e) => self.session.report_clipboard_error(&e),
        }
    }

    fn show_preview_window(&mut self, ctx: &egui::Context) {
        if !self.show_preview {
            return;
        }
        let Some((uri, bytes)) = self.preview.clone() else {
            self.show_preview = false;
            return;
        };

        let mut open = true;
        egui::Window::new("🖼 Screenshot")
            .open(&mut open)
            .resizable(true)
            .default_size([900.0, 700.0])
            .show(ctx, |ui| {
                egui::ScrollArea::both().show(ui, |ui| {
                    ui.add(egui::Image::from_bytes(uri, bytes));
                });
            });
        self.show_preview = open;
    }

    fn show_regions(&mut self, ctx: &egui::Context) {
        let groups = self.view.groups(self.session.store()).to_vec();
        self.sync_editors(&groups);

        let copied_region = self
            .copied
            .as_ref()
            .filter(|(_, at)| at.elapsed() < COPIED_INDICATOR)
            .map(|(region, _)| region.clone());

        let mut actions: Vec<(String, TableAction)> = Vec::new();
        let mut commands: Vec<(String, RegionCommand)> = Vec::new();

        egui::CentralPanel::default().show(ctx, |ui| {
            if groups.is_empty() {
                let hint = if self.session.is_busy() {
                    "Analyzing screenshot..."
                } else if self.session.image().is_some() {
                    "Click Analyze to extract requirements from the screenshot."
                } else {
                    "No screenshot loaded."
                };
                ui.centered_and_justified(|ui| ui.label(hint));
                return;
            }

            egui::ScrollArea::vertical()
                .auto_shrink([false, false])
                .show(ui, |ui| {
                    for group in &groups {
                        let Some(editor) = self.editors.get(&group.name) else {
                            continue;
                        };
                        let focus_title = self.focus_title.as_deref() == Some(group.name.as_str());
                        let copied = copied_region.as_deref() == Some(group.name.as_str());

                        let mut region_actions = Vec::new();
                        let mut region_commands = Vec::new();
                        region_table(
                            ui,
                            editor,
                            group,
                            focus_title,
                            copied,
                            &mut region_actions,
                            &mut region_commands,
                        );
                        if focus_title {
                            self.focus_title = None;
                        }
                        if region_actions.contains(&TableAction::BeginRename) {
                            self.focus_title = Some(group.name.clone());
                        }

                        let name = &group.name;
                        actions.extend(region_actions.into_iter().map(|a| (name.clone(), a)));
                        commands.extend(region_commands.into_iter().map(|c| (name.clone(), c)));
                        ui.add_space(12.0);
                    }
                });
        });

        self.apply_actions(actions);
        for (region, command) in commands {
            match command {
                RegionCommand::Copy => self.copy_region(&region),
                RegionCommand::ExportCsv => self.export_region(&region),
            }
        }
    }

    fn show_key_dialog(&mut self, ctx: &egui::Context) {
        if !self.show_key_dialog {
            return;
        }

        let mut save = false;
        let mut close = false;

        egui::Window::new("🔑 Gemini API Key")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                ui.label("The key is stored locally and only sent with analysis requests.");
                ui.add_space(6.0);

                ui.horizontal(|ui| {
                    ui.add(
                        egui::TextEdit::singleline(&mut self.key_input)
                            .password(!self.key_visible)
                            .hint_text("Paste your API key")
                            .desired_width(320.0),
                    );
                    let toggle = if self.key_visible { "🙈 Hide" } else { "👁 Show" };
                    if ui.button(toggle).clicked() {
                        self.key_visible = !self.key_visible;
                    }
                });

                ui.label(
                    egui::RichText::new(&self.key_status)
                        .small()
                        .color(egui::Color32::GRAY),
                );

                ui.add_space(10.0);
                ui.separator();

                ui.horizontal(|ui| {
                    if ui.button("💾 Save").clicked() {
                        save = true;
                    }
                    if ui.button("Remove Saved Key").clicked() {
                        self.key_input.clear();
                        save = true;
                    }
                    if ui.button("Cancel").clicked() {
                        close = true;
                    }
                });
            });

        if save && self.save_key() {
            close = true;
        }
        if close {
            self.key_input.clear();
            self.show_key_dialog = false;
        }
    }

    fn paint_drop_hint(&self, ctx: &egui::Context) {
        if ctx.input(|i| i.raw.hovered_files.is_empty()) {
            return;
        }

        let painter = ctx.layer_painter(egui::LayerId::new(
            egui::Order::Foreground,
            egui::Id::new("file_drop_target"),
        ));
        let screen_rect = ctx.screen_rect();
        painter.rect_filled(screen_rect, 0.0, egui::Color32::from_black_alpha(192));
        painter.text(
            screen_rect.center(),
            egui::Align2::CENTER_CENTER,
            "Drop screenshot to load",
            egui::TextStyle::Heading.resolve(&ctx.style()),
            egui::Color32::WHITE,
        );
    }
}

/// Draws one region's table and records the gestures made on it
fn region_table(
    ui: &mut egui::Ui,
    editor: &TableEditor,
    group: &RegionSnapshot,
    focus_title: bool,
    copied: bool,
    actions: &mut Vec<TableAction>,
    commands: &mut Vec<RegionCommand>,
) {
    // A drag released outside any row leaves no payload behind
    if editor.drag_state().is_some() && !egui::DragAndDrop::has_any_payload(ui.ctx()) {
        actions.push(TableAction::CancelDrag);
    }

    ui.group(|ui| {
        ui.horizontal(|ui| {
            if editor.is_editing_title() {
                let mut draft = editor.title().to_string();
                let response = ui.add(
                    egui::TextEdit::singleline(&mut draft)
                        .id(egui::Id::new(("region_title", editor.region())))
                        .font(egui::TextStyle::Heading)
                        .desired_width(240.0),
                );
                if focus_title {
                    response.request_focus();
                }
                if response.changed() {
                    actions.push(TableAction::SetTitleDraft(draft));
                }
                if response.lost_focus() {
                    if ui.input(|i| i.key_pressed(egui::Key::Escape)) {
                        actions.push(TableAction::CancelRename);
                    } else {
                        actions.push(TableAction::CommitRename);
                    }
                }
            } else {
                let heading = ui.add(
                    egui::Label::new(egui::RichText::new(&group.name).heading())
                        .sense(egui::Sense::click()),
                );
                if heading.on_hover_text("Double-click to rename").double_clicked() {
                    actions.push(TableAction::BeginRename);
                }
                if ui.small_button("✏").on_hover_text("Rename region").clicked() {
                    actions.push(TableAction::BeginRename);
                }
            }

            ui.label(egui::RichText::new(format!("{} items", group.items.len())).weak());

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if ui.button("💾 Export CSV").clicked() {
                    commands.push(RegionCommand::ExportCsv);
                }
                let copy_label = if copied { "✔ Copied" } else { "📋 Copy" };
                if ui.button(copy_label).clicked() {
                    commands.push(RegionCommand::Copy);
                }
                if ui.button("➕ Add Row").clicked() {
                    actions.push(TableAction::AddRow);
                }
            });
        });

        egui::Grid::new(("region_grid", editor.region()))
            .striped(true)
            .num_columns(ItemField::COLUMNS.len() + 2)
            .show(ui, |ui| {
                ui.label("");
                for column in ItemField::COLUMNS {
                    ui.strong(column.header());
                }
                ui.label("");
                ui.end_row();

                for item in &group.items {
                    table_row(ui, item, actions);
                    ui.end_row();
                }
            });
    });
}

fn table_row(
    ui: &mut egui::Ui,
    item: &RequirementItem,
    actions: &mut Vec<TableAction>,
) {
    let handle = ui
        .dnd_drag_source(egui::Id::new(("row_drag", item.id)), item.id, |ui| {
            ui.label("☰");
        })
        .response
        .on_hover_text("Drag to reorder");
    if handle.drag_started() {
        actions.push(TableAction::DragStart(item.id));
    }

    let mut row = handle;
    for column in ItemField::COLUMNS {
        let mut value = item.field(column).to_string();
        let width = if column == ItemField::FunctionName {
            160.0
        } else {
            200.0
        };
        let response = ui.add(
            egui::TextEdit::multiline(&mut value)
                .id(egui::Id::new((item.id, column)))
                .desired_rows(1)
                .desired_width(width),
        );
        if response.changed() {
            actions.push(TableAction::EditField {
                id: item.id,
                field: column,
                value,
            });
        }
        row = row.union(response);
    }

    if ui.small_button("🗑").on_hover_text("Delete row").clicked() {
        actions.push(TableAction::DeleteRow(item.id));
    }

    if let Some(source) = row.dnd_hover_payload::<Uuid>() {
        if *source != item.id {
            actions.push(TableAction::DragOver(item.id));
            ui.painter().hline(
                row.rect.x_range(),
                row.rect.top(),
                egui::Stroke::new(2.0, ui.visuals().selection.bg_fill),
            );
        }
    }

    if let Some(source) = row.dnd_release_payload::<Uuid>() {
        actions.push(TableAction::DragStart(*source));
        actions.push(TableAction::DragOver(item.id));
        actions.push(TableAction::Drop);
    }
}

impl eframe::App for Ui2PrdApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_job(ctx);
        self.handle_dropped_files(ctx);

        self.show_top_panel(ctx);
        self.show_notice_bar(ctx);
        self.show_image_panel(ctx);
        self.show_regions(ctx);

        self.show_preview_window(ctx);
        self.show_key_dialog(ctx);
        self.paint_drop_hint(ctx);

        if let Some((_, at)) = &self.copied {
            let elapsed = at.elapsed();
            if elapsed < COPIED_INDICATOR {
                ctx.request_repaint_after(COPIED_INDICATOR - elapsed);
            } else {
                self.copied = None;
            }
        }
    }
}
