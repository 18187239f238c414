use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};

use serde::{Deserialize, Serialize};
use serde_json::json;
use tauri::{AppHandle, Manager, State};

use crate::app::AuditTracker;
use crate::board::MenuAnchor;
use crate::clock::SystemClock;
use crate::config::{resolve_data_dir, Settings};
use crate::editor::ChecklistEditor;
use crate::history::{HistoryFilter, HistoryView};
use crate::model::{AuditInstance, Template, WorkflowTag};
use crate::reply;
use crate::storage::{FileStore, SharedStore};
use crate::templates::TemplateDraft;

pub struct AppState {
    root: PathBuf,
    tracker: Mutex<AuditTracker>,
}

impl AppState {
    fn open(root: PathBuf) -> Result<Self, String> {
        let store = FileStore::open(root.as_path()).map_err(|err| err.to_string())?;
        let settings = Settings::load(root.as_path());
        let shared: SharedStore = Arc::new(store);
        let tracker = AuditTracker::open(shared, Arc::new(SystemClock), &settings)
            .map_err(|err| err.to_string())?;
        Ok(Self {
            root,
            tracker: Mutex::new(tracker),
        })
    }
}

#[derive(Serialize)]
struct StorageInfoResult {
    ok: bool,
    path_label: String,
}

#[derive(Deserialize)]
struct TemplatesListRequest {
    show_all: Option<bool>,
}

#[derive(Deserialize)]
struct AuditCreateRequest {
    template_id: String,
    name: Option<String>,
}

#[derive(Deserialize)]
struct AuditIdRequest {
    id: String,
}

#[derive(Deserialize)]
struct BoardMoveRequest {
    id: String,
    tag: WorkflowTag,
}

#[derive(Deserialize)]
struct BoardMenuOpenRequest {
    id: String,
    left: f64,
    top: f64,
}

#[derive(Deserialize)]
struct BoardMenuChooseRequest {
    tag: WorkflowTag,
}

#[derive(Deserialize)]
struct HistoryRequest {
    name: Option<String>,
    template_name: Option<String>,
    from: Option<String>,
    to: Option<String>,
}

#[derive(Deserialize)]
struct EditorOpenRequest {
    id: String,
    read_only: Option<bool>,
}

#[derive(Deserialize)]
struct EditorCheckRequest {
    item_id: String,
    checked: bool,
}

#[derive(Deserialize)]
struct EditorCommentRequest {
    item_id: String,
    text: String,
}

#[derive(Deserialize)]
struct EditorItemRequest {
    item_id: String,
}

#[derive(Deserialize)]
struct EditorRenameRequest {
    name: String,
}

#[derive(Deserialize)]
struct AuthLoginRequest {
    email: String,
    password: String,
}

#[derive(Deserialize)]
struct AuthRegisterRequest {
    name: String,
    email: String,
    password: String,
}

fn lock(state: &AppState) -> Result<MutexGuard<'_, AuditTracker>, String> {
    state
        .tracker
        .lock()
        .map_err(|_| "Tracker state is unavailable.".to_string())
}

/// Everything except the auth commands needs a signed-in user.
fn signed_in(state: &AppState) -> Result<MutexGuard<'_, AuditTracker>, String> {
    let tracker = lock(state)?;
    tracker.session().map_err(|err| err.to_string())?;
    Ok(tracker)
}

fn editor_result(applied: bool, editor: Option<&ChecklistEditor>) -> serde_json::Value {
    json!({ "applied": applied, "editor": editor })
}

#[tauri::command]
fn app_version(app: AppHandle) -> String {
    app.package_info().version.to_string()
}

#[tauri::command]
fn storage_info(state: State<'_, AppState>) -> StorageInfoResult {
    StorageInfoResult {
        ok: true,
        path_label: state.root.to_string_lossy().to_string(),
    }
}

#[tauri::command]
fn templates_list(
    state: State<'_, AppState>,
    payload: TemplatesListRequest,
) -> Result<Vec<Template>, String> {
    let tracker = signed_in(&state)?;
    Ok(tracker.templates.visible(payload.show_all.unwrap_or(false)))
}

#[tauri::command]
fn template_create(
    state: State<'_, AppState>,
    payload: TemplateDraft,
) -> Result<serde_json::Value, String> {
    let mut tracker = signed_in(&state)?;
    Ok(reply::inline("template", tracker.create_template(payload)))
}

#[tauri::command]
fn audits_list(state: State<'_, AppState>) -> Result<Vec<AuditInstance>, String> {
    let tracker = signed_in(&state)?;
    Ok(tracker.audits.all().to_vec())
}

#[tauri::command]
fn audit_create(
    state: State<'_, AppState>,
    payload: AuditCreateRequest,
) -> Result<AuditInstance, String> {
    let mut tracker = signed_in(&state)?;
    tracker
        .start_audit(
            payload.template_id.as_str(),
            payload.name.as_deref().unwrap_or_default(),
        )
        .map_err(|err| err.to_string())
}

#[tauri::command]
fn audit_delete(state: State<'_, AppState>, payload: AuditIdRequest) -> Result<bool, String> {
    let mut tracker = signed_in(&state)?;
    tracker
        .delete_audit(payload.id.as_str())
        .map_err(|err| err.to_string())?;
    Ok(true)
}

#[tauri::command]
fn audit_complete(
    state: State<'_, AppState>,
    payload: AuditIdRequest,
) -> Result<AuditInstance, String> {
    let mut tracker = signed_in(&state)?;
    tracker
        .complete_audit(payload.id.as_str())
        .map_err(|err| err.to_string())
}

#[tauri::command]
fn audit_unarchive(
    state: State<'_, AppState>,
    payload: AuditIdRequest,
) -> Result<AuditInstance, String> {
    let mut tracker = signed_in(&state)?;
    tracker
        .unarchive_audit(payload.id.as_str())
        .map_err(|err| err.to_string())
}

#[tauri::command]
fn board_get(state: State<'_, AppState>) -> Result<serde_json::Value, String> {
    let tracker = signed_in(&state)?;
    Ok(json!({
        "board": tracker.board(),
        "menu": tracker.board.menu(),
        "canUndo": tracker.can_undo(),
    }))
}

#[tauri::command]
fn board_move(
    state: State<'_, AppState>,
    payload: BoardMoveRequest,
) -> Result<serde_json::Value, String> {
    let mut tracker = signed_in(&state)?;
    let notice = tracker
        .move_audit(payload.id.as_str(), payload.tag)
        .map_err(|err| err.to_string())?;
    Ok(json!({ "ok": true, "notice": notice }))
}

#[tauri::command]
fn board_undo(state: State<'_, AppState>) -> Result<serde_json::Value, String> {
    let mut tracker = signed_in(&state)?;
    match tracker.undo_move().map_err(|err| err.to_string())? {
        Some(audit) => Ok(json!({ "ok": true, "audit": audit })),
        None => Ok(reply::failure("Nothing to undo.")),
    }
}

#[tauri::command]
fn board_menu_open(
    state: State<'_, AppState>,
    payload: BoardMenuOpenRequest,
) -> Result<serde_json::Value, String> {
    let mut tracker = signed_in(&state)?;
    let anchor = MenuAnchor {
        left: payload.left,
        top: payload.top,
    };
    tracker
        .open_status_menu(payload.id.as_str(), anchor)
        .map_err(|err| err.to_string())?;
    Ok(json!({ "menu": tracker.board.menu() }))
}

#[tauri::command]
fn board_menu_close(state: State<'_, AppState>) -> Result<serde_json::Value, String> {
    let mut tracker = signed_in(&state)?;
    tracker.board.close_menu();
    Ok(json!({ "menu": tracker.board.menu() }))
}

#[tauri::command]
fn board_menu_choose(
    state: State<'_, AppState>,
    payload: BoardMenuChooseRequest,
) -> Result<serde_json::Value, String> {
    let mut tracker = signed_in(&state)?;
    let notice = tracker
        .choose_status(payload.tag)
        .map_err(|err| err.to_string())?;
    Ok(json!({ "ok": notice.is_some(), "notice": notice }))
}

#[tauri::command]
fn history_get(
    state: State<'_, AppState>,
    payload: HistoryRequest,
) -> Result<HistoryView, String> {
    let tracker = signed_in(&state)?;
    let filter = HistoryFilter::from_form(
        payload.name.as_deref().unwrap_or_default(),
        payload.template_name.as_deref().unwrap_or_default(),
        payload.from.as_deref().unwrap_or_default(),
        payload.to.as_deref().unwrap_or_default(),
    )
    .map_err(|err| err.to_string())?;
    Ok(tracker.history(&filter))
}

#[tauri::command]
fn editor_open(
    state: State<'_, AppState>,
    payload: EditorOpenRequest,
) -> Result<ChecklistEditor, String> {
    let mut tracker = signed_in(&state)?;
    tracker
        .open_editor(payload.id.as_str(), payload.read_only.unwrap_or(false))
        .cloned()
        .map_err(|err| err.to_string())
}

#[tauri::command]
fn editor_set_checked(
    state: State<'_, AppState>,
    payload: EditorCheckRequest,
) -> Result<serde_json::Value, String> {
    let mut tracker = signed_in(&state)?;
    let applied = tracker.set_item_checked(payload.item_id.as_str(), payload.checked);
    Ok(editor_result(applied, tracker.editor()))
}

#[tauri::command]
fn editor_set_comment(
    state: State<'_, AppState>,
    payload: EditorCommentRequest,
) -> Result<serde_json::Value, String> {
    let mut tracker = signed_in(&state)?;
    let applied = tracker.set_item_comment(payload.item_id.as_str(), payload.text.as_str());
    Ok(editor_result(applied, tracker.editor()))
}

#[tauri::command]
fn editor_toggle_comment(
    state: State<'_, AppState>,
    payload: EditorItemRequest,
) -> Result<serde_json::Value, String> {
    let mut tracker = signed_in(&state)?;
    let applied = tracker.toggle_item_comment(payload.item_id.as_str());
    Ok(editor_result(applied, tracker.editor()))
}

#[tauri::command]
fn editor_rename(
    state: State<'_, AppState>,
    payload: EditorRenameRequest,
) -> Result<serde_json::Value, String> {
    let mut tracker = signed_in(&state)?;
    let applied = tracker.rename_audit(payload.name.as_str());
    Ok(editor_result(applied, tracker.editor()))
}

#[tauri::command]
fn editor_save(state: State<'_, AppState>) -> Result<Option<AuditInstance>, String> {
    let mut tracker = signed_in(&state)?;
    tracker.save_editor().map_err(|err| err.to_string())
}

#[tauri::command]
fn editor_close(state: State<'_, AppState>) -> Result<bool, String> {
    let mut tracker = signed_in(&state)?;
    tracker.close_editor();
    Ok(true)
}

#[tauri::command]
fn auth_current(state: State<'_, AppState>) -> Result<serde_json::Value, String> {
    let tracker = lock(&state)?;
    Ok(json!({ "user": tracker.auth.current_user() }))
}

#[tauri::command]
fn auth_login(
    state: State<'_, AppState>,
    payload: AuthLoginRequest,
) -> Result<serde_json::Value, String> {
    let mut tracker = lock(&state)?;
    let result = tracker
        .auth
        .login(payload.email.as_str(), payload.password.as_str());
    Ok(reply::inline("user", result))
}

#[tauri::command]
fn auth_register(
    state: State<'_, AppState>,
    payload: AuthRegisterRequest,
) -> Result<serde_json::Value, String> {
    let mut tracker = lock(&state)?;
    let result = tracker.auth.register(
        payload.name.as_str(),
        payload.email.as_str(),
        payload.password.as_str(),
    );
    Ok(reply::inline("user", result))
}

#[tauri::command]
fn auth_logout(state: State<'_, AppState>) -> Result<bool, String> {
    let mut tracker = lock(&state)?;
    tracker.close_editor();
    tracker.board.dismiss();
    tracker.auth.logout().map_err(|err| err.to_string())?;
    Ok(true)
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("audit_tracker=info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

pub fn run() {
    init_tracing();
    tauri::Builder::default()
        .setup(|app| {
            let base = app.path().app_data_dir()?;
            let root = resolve_data_dir(base.as_path());
            tracing::info!(root = %root.display(), "opening audit storage");
            let state = AppState::open(root)?;
            app.manage(state);
            Ok(())
        })
        .invoke_handler(tauri::generate_handler![
            app_version,
            storage_info,
            templates_list,
            template_create,
            audits_list,
            audit_create,
            audit_delete,
            audit_complete,
            audit_unarchive,
            board_get,
            board_move,
            board_undo,
            board_menu_open,
            board_menu_close,
            board_menu_choose,
            history_get,
            editor_open,
            editor_set_checked,
            editor_set_comment,
            editor_toggle_comment,
            editor_rename,
            editor_save,
            editor_close,
            auth_current,
            auth_login,
            auth_register,
            auth_logout
        ])
        .run(tauri::generate_context!())
        .expect("failed to run Audit Tracker");
}
