use ratatui::crossterm::event::{self, KeyCode, KeyModifiers};

/// Single-line editor state for the search prompt.
#[derive(Default)]
pub struct Prompt {
    text: String,
    cursor: usize,
    finished: bool,
    canceled: bool,
}

#[derive(Default, Clone, Debug, PartialEq)]
pub struct PromptResult {
    pub text: String,
    pub cursor: usize,
    pub finished: bool,
    pub canceled: bool,
}

impl Prompt {
    pub fn read(&mut self, key: event::KeyEvent) -> PromptResult {
        match (key.code, key.modifiers) {
            (KeyCode::Enter, KeyModifiers::NONE) => self.enter(),
            (KeyCode::Esc, KeyModifiers::NONE) => self.escape(),
            (KeyCode::Backspace, KeyModifiers::NONE) => self.backspace(),
            (KeyCode::Left, KeyModifiers::NONE) => self.left(),
            (KeyCode::Right, KeyModifiers::NONE) => self.right(),
            (code, _) => self.key(code),
        }
    }

    pub fn get(&self) -> PromptResult {
        PromptResult {
            text: self.text.clone(),
            cursor: self.cursor,
            finished: self.finished,
            canceled: self.canceled,
        }
    }

    pub fn clear(&mut self) {
        self.text.clear();
        self.cursor = 0;
        self.finished = false;
        self.canceled = false;
    }

    fn enter(&mut self) -> PromptResult {
        self.finished = true;
        self.get()
    }

    fn escape(&mut self) -> PromptResult {
        self.text.clear();
        self.cursor = 0;
        self.canceled = true;
        self.finished = true;
        self.get()
    }

    fn backspace(&mut self) -> PromptResult {
        if self.cursor > 0 {
            self.cursor -= 1;
            let pos = self.byte_pos();
            self.text.remove(pos);
        }
        self.get()
    }

    fn left(&mut self) -> PromptResult {
        self.cursor = self.cursor.saturating_sub(1);
        self.get()
    }

    fn right(&mut self) -> PromptResult {
        if self.cursor < self.text.chars().count() {
            self.cursor += 1;
        }
        self.get()
    }

    fn key(&mut self, code: KeyCode) -> PromptResult {
        if let Some(chr) = code.as_char() {
            let pos = self.byte_pos();
            self.text.insert(pos, chr);
            self.cursor += 1;
        }
        self.get()
    }

    // Byte offset of the cursor, which counts characters.
    fn byte_pos(&self) -> usize {
        self.text
            .char_indices()
            .nth(self.cursor)
            .map(|(byte_idx, _)| byte_idx)
            .unwrap_or(self.text.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::crossterm::event::KeyEvent;

    fn press(prompt: &mut Prompt, code: KeyCode) -> PromptResult {
        prompt.read(KeyEvent::from(code))
    }

    #[test]
    fn typing_builds_the_text() {
        let mut p = Prompt::default();
        press(&mut p, KeyCode::Char('h'));
        press(&mut p, KeyCode::Char('r'));
        let r = press(&mut p, KeyCode::Enter);
        assert_eq!(r.text, "hr");
        assert!(r.finished);
        assert!(!r.canceled);
    }

    #[test]
    fn backspace_removes_before_the_cursor() {
        let mut p = Prompt::default();
        press(&mut p, KeyCode::Char('a'));
        press(&mut p, KeyCode::Char('b'));
        press(&mut p, KeyCode::Char('c'));
        press(&mut p, KeyCode::Left);
        let r = press(&mut p, KeyCode::Backspace);
        assert_eq!(r.text, "ac");
        assert_eq!(r.cursor, 1);
    }

    #[test]
    fn escape_cancels_and_clears() {
        let mut p = Prompt::default();
        press(&mut p, KeyCode::Char('x'));
        let r = press(&mut p, KeyCode::Esc);
        assert!(r.canceled);
        assert!(r.finished);
        assert!(r.text.is_empty());
    }

    #[test]
    fn backspace_at_the_start_is_a_noop() {
        let mut p = Prompt::default();
        let r = press(&mut p, KeyCode::Backspace);
        assert_eq!(r.text, "");
        assert_eq!(r.cursor, 0);
    }
}
