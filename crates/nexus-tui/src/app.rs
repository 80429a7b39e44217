use std::sync::Arc;
use std::time::Duration;

use nexus_core::{
    resolve_image, AvatarRequestController, ConversationStore, ImageOptions, PendingImage,
    PendingReply, RemoteError, RemoteGenerationClient,
};
use ratatui::layout::Rect;
use tokio::sync::mpsc::UnboundedSender;

use crate::tui::AppEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

/// Static facts about the session shown in the header.
#[derive(Debug, Clone)]
pub struct SessionInfo {
    pub model: String,
    pub key_source: Option<&'static str>,
    pub image_options: ImageOptions,
    pub image_delay: Duration,
}

pub struct App {
    // Core state
    pub should_quit: bool,
    pub input_mode: InputMode,
    pub info: SessionInfo,

    // Conversation
    pub conversation: ConversationStore,
    pub draft_cursor: usize, // cursor position in the draft, in chars
    pub chat_scroll: u16,
    pub chat_height: u16, // inner height of the thread pane
    pub chat_width: u16,  // inner width of the thread pane
    pub chat_area: Option<Rect>,

    // Avatar modal
    pub show_avatar_modal: bool,
    pub avatar: AvatarRequestController,
    pub avatar_cursor: usize,

    // Animation state
    pub animation_frame: u8, // 0-2 for ellipsis animation

    // One-line feedback in the footer ("Copied", clipboard failures)
    pub status: Option<String>,

    client: Arc<dyn RemoteGenerationClient>,
    events: UnboundedSender<AppEvent>,
}

impl App {
    pub fn new(
        client: Arc<dyn RemoteGenerationClient>,
        info: SessionInfo,
        events: UnboundedSender<AppEvent>,
    ) -> Self {
        let avatar = AvatarRequestController::new(info.image_options);

        Self {
            should_quit: false,
            input_mode: InputMode::Editing,
            info,

            conversation: ConversationStore::new(),
            draft_cursor: 0,
            chat_scroll: 0,
            chat_height: 0,
            chat_width: 0,
            chat_area: None,

            show_avatar_modal: false,
            avatar,
            avatar_cursor: 0,

            animation_frame: 0,
            status: None,

            client,
            events,
        }
    }

    /// Send the draft. Ignored while a reply is pending or the draft is blank.
    pub fn send_message(&mut self) {
        let Some(ticket) = self.conversation.submit_draft() else {
            return;
        };
        self.draft_cursor = 0;
        self.animation_frame = 0;
        self.scroll_chat_to_bottom();
        self.spawn_reply(ticket);
    }

    fn spawn_reply(&self, ticket: PendingReply) {
        let client = Arc::clone(&self.client);
        let tx = self.events.clone();
        tokio::spawn(async move {
            let result = client.generate_reply(ticket.prompt()).await;
            // The loop is gone if this fails; nothing left to update.
            let _ = tx.send(AppEvent::Reply(ticket, result));
        });
    }

    pub fn on_reply(&mut self, ticket: PendingReply, result: Result<String, RemoteError>) {
        if self.conversation.complete_reply(ticket, result) {
            self.scroll_chat_to_bottom();
        }
    }

    pub fn open_avatar_modal(&mut self) {
        self.show_avatar_modal = true;
        self.avatar_cursor = self.avatar.prompt_text().chars().count();
    }

    /// Closing the modal discards its state, including a request still in flight.
    pub fn close_avatar_modal(&mut self) {
        self.show_avatar_modal = false;
        self.avatar.dismiss();
        self.avatar_cursor = 0;
    }

    pub fn generate_avatar(&mut self) {
        let Some(ticket) = self.avatar.submit_current(self.client.as_ref()) else {
            return;
        };
        self.animation_frame = 0;
        self.spawn_avatar(ticket);
    }

    fn spawn_avatar(&self, ticket: PendingImage) {
        let client = Arc::clone(&self.client);
        let tx = self.events.clone();
        let delay = self.info.image_delay;
        tokio::spawn(async move {
            let result = resolve_image(client.as_ref(), &ticket, delay).await;
            let _ = tx.send(AppEvent::AvatarReady(ticket, result));
        });
    }

    pub fn on_avatar_ready(&mut self, ticket: PendingImage, result: Result<(), RemoteError>) {
        self.avatar.complete(ticket, result);
    }

    /// Copy the current image link. The clipboard tools can block, so this
    /// runs off the loop and reports back as [`AppEvent::Copied`].
    pub fn copy_image_link(&self) {
        let Some(locator) = self.avatar.image_ref().map(str::to_string) else {
            return;
        };
        let tx = self.events.clone();
        tokio::task::spawn_blocking(move || {
            let copied = copy_to_clipboard(&locator);
            let _ = tx.send(AppEvent::Copied(copied));
        });
    }

    pub fn on_copied(&mut self, copied: bool) {
        self.status = Some(if copied {
            "Image link copied".to_string()
        } else {
            "No clipboard tool found (pbcopy, wl-copy, xclip)".to_string()
        });
    }

    pub fn is_busy(&self) -> bool {
        self.conversation.is_waiting_for_reply() || self.avatar.is_generating()
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.is_busy() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    pub fn scroll_down(&mut self, lines: u16) {
        let max_scroll = self.total_chat_lines().saturating_sub(self.chat_height);
        self.chat_scroll = self.chat_scroll.saturating_add(lines).min(max_scroll);
    }

    pub fn scroll_up(&mut self, lines: u16) {
        self.chat_scroll = self.chat_scroll.saturating_sub(lines);
    }

    /// Scroll so the newest message (or "Thinking...") is visible
    pub fn scroll_chat_to_bottom(&mut self) {
        // Before the first draw the pane size is unknown
        let visible_height = if self.chat_height > 0 { self.chat_height } else { 20 };
        self.chat_scroll = self.total_chat_lines().saturating_sub(visible_height);
    }

    /// Rendered height of the thread, matching the layout in `ui::render_chat`.
    pub fn total_chat_lines(&self) -> u16 {
        let wrap_width = if self.chat_width > 0 { self.chat_width as usize } else { 50 };

        let mut total_lines: usize = 0;
        for msg in self.conversation.messages() {
            total_lines += 1; // sender + time line
            for line in msg.text().lines() {
                // Character count, not bytes, so wide UTF-8 text wraps correctly
                let char_count = line.chars().count();
                total_lines += char_count / wrap_width + 1;
            }
            total_lines += 1; // blank line after message
        }

        if self.conversation.is_waiting_for_reply() {
            total_lines += 2; // "AI" + "Thinking..."
        }

        u16::try_from(total_lines).unwrap_or(u16::MAX)
    }
}

/// Copy to the system clipboard with whichever tool is installed.
fn copy_to_clipboard(text: &str) -> bool {
    use std::io::Write;
    use std::process::{Command, Stdio};

    const TOOLS: [(&str, &[&str]); 3] = [
        ("pbcopy", &[]),
        ("wl-copy", &[]),
        ("xclip", &["-selection", "clipboard"]),
    ];

    for (program, args) in TOOLS {
        let Ok(mut child) = Command::new(program).args(args).stdin(Stdio::piped()).spawn() else {
            continue;
        };
        let written = match child.stdin.take() {
            Some(mut stdin) => stdin.write_all(text.as_bytes()).is_ok(),
            None => false,
        };
        if !written {
            let _ = child.kill();
            let _ = child.wait();
            continue;
        }
        if child.wait().map(|status| status.success()).unwrap_or(false) {
            return true;
        }
    }

    tracing::warn!("no clipboard tool available");
    false
}
