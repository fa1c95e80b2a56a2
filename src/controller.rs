use std::time::Duration;

use ratatui::crossterm::event::{self, Event, KeyCode, KeyModifiers};
use tracing::trace;

use crate::domain::{AppConfig, HrError, Message};
use crate::model::Model;

pub struct Controller {
    event_poll_time: u64,
}

impl Controller {
    pub fn new(cfg: &AppConfig) -> Self {
        Self {
            event_poll_time: cfg.event_poll_time,
        }
    }

    pub fn handle_event(&self, model: &Model) -> Result<Option<Message>, HrError> {
        if event::poll(Duration::from_millis(self.event_poll_time))? {
            match event::read()? {
                Event::Key(key) if key.kind == event::KeyEventKind::Press => {
                    // While the search prompt is open, keys go to it verbatim.
                    if model.raw_keyevents() {
                        return Ok(Some(Message::RawKey(key)));
                    }
                    return Ok(self.handle_key(key));
                }
                Event::Resize(width, height) => {
                    return Ok(Some(Message::Resize(width as usize, height as usize)));
                }
                _ => {}
            }
        }
        Ok(None)
    }

    fn handle_key(&self, key: event::KeyEvent) -> Option<Message> {
        let message = match (key.code, key.modifiers) {
            (KeyCode::Char('q'), KeyModifiers::NONE) => Some(Message::Quit),
            (KeyCode::Char('j'), KeyModifiers::NONE) | (KeyCode::Down, _) => {
                Some(Message::MoveDown)
            }
            (KeyCode::Char('k'), KeyModifiers::NONE) | (KeyCode::Up, _) => Some(Message::MoveUp),
            (KeyCode::Char('h'), KeyModifiers::NONE) | (KeyCode::Left, _) => {
                Some(Message::MoveLeft)
            }
            (KeyCode::Char('l'), KeyModifiers::NONE) | (KeyCode::Right, _) => {
                Some(Message::MoveRight)
            }
            (KeyCode::Char('g'), KeyModifiers::NONE) | (KeyCode::Home, _) => {
                Some(Message::MoveBeginning)
            }
            (KeyCode::Char('G'), KeyModifiers::SHIFT) | (KeyCode::End, _) => {
                Some(Message::MoveEnd)
            }
            (KeyCode::Char('n'), KeyModifiers::NONE) | (KeyCode::PageDown, _) => {
                Some(Message::NextPage)
            }
            (KeyCode::Char('p'), KeyModifiers::NONE) | (KeyCode::PageUp, _) => {
                Some(Message::PrevPage)
            }
            (KeyCode::Char('z'), KeyModifiers::NONE) => Some(Message::CyclePageSize),
            (KeyCode::Char('s'), KeyModifiers::NONE) => Some(Message::SortAscending),
            (KeyCode::Char('S'), KeyModifiers::SHIFT) => Some(Message::SortDescending),
            (KeyCode::Char('/'), KeyModifiers::NONE) => Some(Message::Search),
            (KeyCode::Char(' '), KeyModifiers::NONE) => Some(Message::ToggleSelect),
            (KeyCode::Char('a'), KeyModifiers::NONE) => Some(Message::SelectAll),
            (KeyCode::Char('c'), KeyModifiers::NONE) => Some(Message::ClearSelection),
            (KeyCode::Char('d'), KeyModifiers::NONE) => Some(Message::Delete),
            (KeyCode::Char('y'), KeyModifiers::NONE) => Some(Message::Confirm),
            (KeyCode::Char('t'), KeyModifiers::NONE) => Some(Message::NextCollection),
            (KeyCode::Char('x'), KeyModifiers::NONE) => Some(Message::CopyCell),
            (KeyCode::Char('X'), KeyModifiers::SHIFT) => Some(Message::CopyRow),
            (KeyCode::Char('?'), _) => Some(Message::Help),
            (KeyCode::Enter, KeyModifiers::NONE) => Some(Message::Confirm),
            (KeyCode::Esc, KeyModifiers::NONE) => Some(Message::Exit),
            _ => None,
        };
        trace!("Mapped: {key:?} => {message:?}");
        message
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::crossterm::event::KeyEvent;

    fn mapped(code: KeyCode) -> Option<Message> {
        let controller = Controller::new(&AppConfig::default());
        controller.handle_key(KeyEvent::from(code))
    }

    #[test]
    fn core_keys_map_to_messages() {
        assert_eq!(mapped(KeyCode::Char('q')), Some(Message::Quit));
        assert_eq!(mapped(KeyCode::Char('j')), Some(Message::MoveDown));
        assert_eq!(mapped(KeyCode::Char('/')), Some(Message::Search));
        assert_eq!(mapped(KeyCode::Char('d')), Some(Message::Delete));
        assert_eq!(mapped(KeyCode::Char(' ')), Some(Message::ToggleSelect));
        assert_eq!(mapped(KeyCode::Esc), Some(Message::Exit));
        assert_eq!(mapped(KeyCode::F(5)), None);
    }
}
