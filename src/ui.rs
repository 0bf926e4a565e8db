use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use log::debug;
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph},
    Frame,
};
use std::cell::Cell;
use std::collections::HashMap;
use std::io;
use std::time::{Duration, Instant};
use textwrap::wrap;
use tui_input::{backend::crossterm::EventHandler, Input};

use chatline::models::{Message, MessageId};
use chatline::presenter::{Notice, NoticeLevel, Presenter};
use chatline::render;

use crate::commands::{self, UserCommand, HELP};

// Export types needed by main module
pub use ratatui::backend::CrosstermBackend;
pub use ratatui::Terminal;

/// Lines moved per PageUp/PageDown
const SCROLL_STEP: usize = 5;

/// What a passphrase is being asked for.
#[derive(Debug, Clone, PartialEq)]
pub enum PromptPurpose {
    SendText(String),
    Decrypt(MessageId),
}

struct PassphrasePrompt {
    purpose: PromptPurpose,
    input: Input,
}

/// Result of one round of input handling.
#[derive(Debug, Clone, PartialEq)]
pub enum UiAction {
    Command(UserCommand),
    /// `None` when the prompt was dismissed
    Passphrase {
        purpose: PromptPurpose,
        passphrase: Option<String>,
    },
    LoadOlder,
    Quit,
}

pub struct TerminalUi {
    messages: Vec<Message>,
    revealed: HashMap<MessageId, String>,
    pinned: Option<(MessageId, String)>,
    notice: Option<(Notice, Instant)>,
    input: Input,
    prompt: Option<PassphrasePrompt>,
    help_visible: bool,
    // Lines scrolled up from the bottom
    scroll: usize,
    max_scroll: Cell<usize>,
    status: String,
    encryption: bool,
    connected: bool,
}

impl TerminalUi {
    pub fn new() -> Self {
        TerminalUi {
            messages: Vec::new(),
            revealed: HashMap::new(),
            pinned: None,
            notice: None,
            input: Input::default(),
            prompt: None,
            help_visible: false,
            scroll: 0,
            max_scroll: Cell::new(0),
            status: "all".to_string(),
            encryption: false,
            connected: false,
        }
    }

    pub fn set_status(&mut self, view: &str, encryption: bool, connected: bool) {
        self.status = view.to_string();
        self.encryption = encryption;
        self.connected = connected;
    }

    pub fn ask_passphrase(&mut self, purpose: PromptPurpose) {
        self.prompt = Some(PassphrasePrompt {
            purpose,
            input: Input::default(),
        });
    }

    pub fn show_help(&mut self) {
        self.help_visible = true;
    }

    /// Append text (an emoji) to the composer.
    pub fn insert_text(&mut self, text: &str) {
        let value = format!("{}{}", self.input.value(), text);
        self.input = Input::default().with_value(value);
    }

    /// Drop notices older than `timeout_secs`.
    pub fn clean_notices(&mut self, timeout_secs: u64) {
        if let Some((_, shown_at)) = &self.notice {
            if shown_at.elapsed() >= Duration::from_secs(timeout_secs) {
                self.notice = None;
            }
        }
    }

    pub fn handle_input(&mut self) -> Result<Option<UiAction>> {
        if !event::poll(Duration::from_millis(10))? {
            return Ok(None);
        }
        let ev = event::read()?;
        let key = match &ev {
            Event::Key(key) if key.kind == KeyEventKind::Press => *key,
            _ => return Ok(None),
        };

        // Passphrase prompt is modal
        if let Some(prompt) = &mut self.prompt {
            match key.code {
                KeyCode::Enter => {
                    let passphrase = prompt.input.value().to_string();
                    let purpose = prompt.purpose.clone();
                    self.prompt = None;
                    return Ok(Some(UiAction::Passphrase {
                        purpose,
                        passphrase: Some(passphrase),
                    }));
                }
                KeyCode::Esc => {
                    let purpose = prompt.purpose.clone();
                    self.prompt = None;
                    return Ok(Some(UiAction::Passphrase {
                        purpose,
                        passphrase: None,
                    }));
                }
                _ => {
                    prompt.input.handle_event(&ev);
                    return Ok(None);
                }
            }
        }

        if self.help_visible {
            self.help_visible = false;
            return Ok(None);
        }

        match key.code {
            KeyCode::Esc => return Ok(Some(UiAction::Quit)),
            KeyCode::Enter => {
                let line = self.input.value().to_string();
                self.input.reset();
                return match commands::parse(&line) {
                    Ok(Some(command)) => Ok(Some(UiAction::Command(command))),
                    Ok(None) => Ok(None),
                    Err(reason) => {
                        self.notify(Notice::error(reason));
                        Ok(None)
                    }
                };
            }
            KeyCode::PageUp => {
                let max = self.max_scroll.get();
                if self.scroll >= max {
                    debug!("Scrolled past the top, requesting older messages");
                    return Ok(Some(UiAction::LoadOlder));
                }
                self.scroll = (self.scroll + SCROLL_STEP).min(max);
            }
            KeyCode::PageDown => {
                self.scroll = self.scroll.saturating_sub(SCROLL_STEP);
            }
            _ => {
                self.input.handle_event(&ev);
            }
        }
        Ok(None)
    }

    pub fn draw<B: Backend>(&self, frame: &mut Frame<B>) {
        let size = frame.size();
        let banner_height = if self.pinned.is_some() { 1 } else { 0 };

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(banner_height), // Pinned banner
                Constraint::Min(3),                // Messages
                Constraint::Length(1),             // Notice line
                Constraint::Length(3),             // Composer
                Constraint::Length(1),             // Status line
            ])
            .split(size);

        if let Some((id, preview)) = &self.pinned {
            let banner = Paragraph::new(format!("📌 #{} {}", id, preview))
                .style(Style::default().fg(Color::Black).bg(Color::Yellow));
            frame.render_widget(banner, chunks[0]);
        }

        draw_messages(frame, self, chunks[1]);

        if let Some((notice, _)) = &self.notice {
            let style = match notice.level {
                NoticeLevel::Info => Style::default().fg(Color::Green),
                NoticeLevel::Error => Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            };
            frame.render_widget(Paragraph::new(notice.text.as_str()).style(style), chunks[2]);
        }

        let lock = if self.encryption { " 🔒" } else { "" };
        let composer = Paragraph::new(self.input.value())
            .block(Block::default().title(format!("Message{}", lock)).borders(Borders::ALL));
        frame.render_widget(composer, chunks[3]);
        if self.prompt.is_none() && !self.help_visible {
            frame.set_cursor(chunks[3].x + 1 + self.input.visual_cursor() as u16, chunks[3].y + 1);
        }

        let link = if self.connected { "online" } else { "offline" };
        let status = format!(
            " view: {} | push: {} | /help for commands, Esc to quit",
            self.status, link
        );
        frame.render_widget(
            Paragraph::new(status).style(Style::default().fg(Color::DarkGray)),
            chunks[4],
        );

        if let Some(prompt) = &self.prompt {
            draw_passphrase_prompt(frame, prompt, size);
        }
        if self.help_visible {
            draw_help_dialog(frame, size);
        }
    }
}

impl Presenter for TerminalUi {
    fn render_all(&mut self, visible: &[&Message]) {
        self.messages = visible.iter().map(|m| (*m).clone()).collect();
    }

    fn render_message(&mut self, message: &Message) {
        self.messages.push(message.clone());
    }

    fn scroll_to_bottom(&mut self) {
        self.scroll = 0;
    }

    fn show_pinned(&mut self, id: &MessageId, preview: &str) {
        self.pinned = Some((id.clone(), preview.to_string()));
    }

    fn hide_pinned(&mut self) {
        self.pinned = None;
    }

    fn reveal_plaintext(&mut self, id: &MessageId, plaintext: &str) {
        self.revealed.insert(id.clone(), plaintext.to_string());
    }

    fn notify(&mut self, notice: Notice) {
        self.notice = Some((notice, Instant::now()));
    }
}

fn message_line(m: &Message, revealed: &HashMap<MessageId, String>) -> String {
    let who = if m.is_from_me() { "You" } else { "Bot" };
    let star = if m.is_favorite { " ★" } else { "" };
    let body = match revealed.get(&m.id) {
        Some(plaintext) if m.is_encrypted => format!("🔓 {}", plaintext),
        _ => render::body(m),
    };
    format!("[{}] #{} {}{}: {}", render::time_label(&m.date), m.id, who, star, body)
}

fn draw_messages<B: Backend>(f: &mut Frame<B>, ui: &TerminalUi, area: Rect) {
    let wrap_width = area.width.saturating_sub(2).max(1) as usize; // Account for borders

    let lines: Vec<ListItem> = ui
        .messages
        .iter()
        .flat_map(|m| {
            let style = if m.is_encrypted {
                Style::default().fg(Color::Magenta)
            } else if m.is_from_me() {
                Style::default()
            } else {
                Style::default().fg(Color::Cyan)
            };
            let full = message_line(m, &ui.revealed);
            wrap(&full, wrap_width)
                .into_iter()
                .map(|l| l.into_owned())
                .collect::<Vec<_>>()
                .into_iter()
                .map(move |line| ListItem::new(Text::from(line)).style(style))
        })
        .collect();

    let total = lines.len();
    ui.max_scroll.set(total.saturating_sub(1));

    let mut list_state = ListState::default();
    if total > 0 {
        let offset = ui.scroll.min(total - 1);
        list_state.select(Some(total - 1 - offset));
    }

    let title = format!("Messages ({})", ui.messages.len());
    let list = List::new(lines)
        .block(Block::default().borders(Borders::ALL).title(title))
        .highlight_style(Style::default()); // Selection only drives scrolling
    f.render_stateful_widget(list, area, &mut list_state);
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width.saturating_sub(4));
    let height = height.min(area.height.saturating_sub(2));
    Rect::new(
        (area.width - width) / 2,
        (area.height - height) / 2,
        width,
        height,
    )
}

fn draw_passphrase_prompt<B: Backend>(f: &mut Frame<B>, prompt: &PassphrasePrompt, area: Rect) {
    let popup_area = centered(area, 50, 5);
    let title = match &prompt.purpose {
        PromptPurpose::SendText(_) => "Passphrase to encrypt".to_string(),
        PromptPurpose::Decrypt(id) => format!("Passphrase for message #{}", id),
    };

    let masked = "*".repeat(prompt.input.value().chars().count());
    let body = Paragraph::new(vec![
        Line::from(masked),
        Line::from(Span::styled(
            "Enter to confirm, Esc to cancel",
            Style::default().fg(Color::DarkGray),
        )),
    ])
    .block(
        Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Yellow)),
    );

    f.render_widget(Clear, popup_area);
    f.render_widget(body, popup_area);
    f.set_cursor(popup_area.x + 1 + prompt.input.visual_cursor() as u16, popup_area.y + 1);
}

fn draw_help_dialog<B: Backend>(f: &mut Frame<B>, area: Rect) {
    let popup_area = centered(area, 80, HELP.len() as u16 + 4);

    let popup_block = Block::default()
        .title("Commands (any key to close)")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    f.render_widget(Clear, popup_area);
    f.render_widget(popup_block, popup_area);

    let inner_area = popup_area.inner(&Margin {
        vertical: 1,
        horizontal: 2,
    });

    let items: Vec<ListItem> = HELP
        .iter()
        .map(|(usage, what)| {
            ListItem::new(Line::from(vec![
                Span::styled(format!("{:<30}", usage), Style::default().fg(Color::Yellow)),
                Span::raw(*what),
            ]))
        })
        .collect();
    f.render_widget(List::new(items), inner_area);
}

pub fn setup_terminal() -> Result<Terminal<CrosstermBackend<io::Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

pub fn restore_terminal(mut terminal: Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}
