//! Create/edit modal state
//!
//! Create and edit share one form. In edit mode the natural-key fields are
//! locked and every field is pre-filled from the entity being edited.

use crate::resource::{FieldDef, FieldKind, FieldValue, FormValues, Resource};

#[derive(Debug, Clone)]
pub enum FormMode<R> {
    Create,
    /// Editing the contained entity, as it was when the form opened
    Edit(R),
}

#[derive(Debug, Clone)]
pub struct FormState<R: Resource> {
    pub mode: FormMode<R>,
    pub values: FormValues,
    pub focus: usize,
    pub submitting: bool,
    /// Sequence number of the outstanding submission
    pub submit_seq: Option<u64>,
    pub error: Option<String>,
}

impl<R: Resource> FormState<R> {
    pub fn create() -> Self {
        Self::with_mode(FormMode::Create, FormValues::defaults_for(R::def()))
    }

    pub fn edit(entity: R) -> Self {
        let values = entity.form_values();
        Self::with_mode(FormMode::Edit(entity), values)
    }

    fn with_mode(mode: FormMode<R>, values: FormValues) -> Self {
        let mut form = Self {
            mode,
            values,
            focus: 0,
            submitting: false,
            submit_seq: None,
            error: None,
        };
        if form.focused().is_some_and(|f| form.is_locked(f)) {
            form.focus_next();
        }
        form
    }

    pub fn is_edit(&self) -> bool {
        matches!(self.mode, FormMode::Edit(_))
    }

    pub fn original(&self) -> Option<&R> {
        match &self.mode {
            FormMode::Edit(entity) => Some(entity),
            FormMode::Create => None,
        }
    }

    pub fn title(&self) -> String {
        let def = R::def();
        match &self.mode {
            FormMode::Create => format!(" New · {} ", def.display_name),
            FormMode::Edit(entity) => {
                format!(" Edit · {} · {} ", def.display_name, entity.display_key())
            },
        }
    }

    pub fn fields(&self) -> &'static [FieldDef] {
        &R::def().fields
    }

    pub fn focused(&self) -> Option<&'static FieldDef> {
        self.fields().get(self.focus)
    }

    /// Natural keys are write-once; nothing is editable mid-submit
    pub fn is_locked(&self, field: &FieldDef) -> bool {
        self.submitting || (self.is_edit() && field.natural_key)
    }

    pub fn focus_next(&mut self) {
        self.move_focus(true);
    }

    pub fn focus_prev(&mut self) {
        self.move_focus(false);
    }

    fn move_focus(&mut self, forward: bool) {
        let len = self.fields().len();
        if len == 0 {
            return;
        }
        for _ in 0..len {
            self.focus = if forward {
                (self.focus + 1) % len
            } else {
                (self.focus + len - 1) % len
            };
            if self.focused().is_some_and(|f| !self.is_locked(f)) {
                return;
            }
        }
    }

    fn editable_focus(&self) -> Option<&'static FieldDef> {
        self.focused().filter(|f| !self.is_locked(f))
    }

    /// Type a character into the focused field
    pub fn input(&mut self, c: char) {
        let Some(field) = self.editable_focus() else {
            return;
        };
        match field.kind {
            FieldKind::Text | FieldKind::Multiline | FieldKind::Variables => {
                if let Some(FieldValue::Text(text)) = self.values.get_mut(&field.key) {
                    text.push(c);
                } else {
                    self.values.set_text(&field.key, c.to_string());
                }
            },
            FieldKind::Flag if c == ' ' => self.toggle(),
            _ => {},
        }
    }

    pub fn backspace(&mut self) {
        let Some(field) = self.editable_focus() else {
            return;
        };
        if let Some(FieldValue::Text(text)) = self.values.get_mut(&field.key) {
            if field.kind != FieldKind::Choice {
                text.pop();
            }
        }
    }

    /// Enter adds a line to multiline fields and moves on from anything else
    pub fn enter(&mut self) {
        match self.editable_focus() {
            Some(field) if field.kind == FieldKind::Multiline => self.input('\n'),
            _ => self.focus_next(),
        }
    }

    /// Flip a flag or step a choice forward
    pub fn toggle(&mut self) {
        let Some(field) = self.editable_focus() else {
            return;
        };
        match field.kind {
            FieldKind::Flag => {
                let on = self.values.flag(&field.key);
                self.values.set_flag(&field.key, !on);
            },
            FieldKind::Choice => self.cycle_choice(true),
            _ => {},
        }
    }

    pub fn cycle_choice(&mut self, forward: bool) {
        let Some(field) = self.editable_focus() else {
            return;
        };
        if field.kind != FieldKind::Choice || field.options.is_empty() {
            return;
        }
        let len = field.options.len();
        let current = self.values.text(&field.key);
        let next = match field.options.iter().position(|o| o == current) {
            Some(i) if forward => (i + 1) % len,
            Some(i) => (i + len - 1) % len,
            None => 0,
        };
        self.values.set_text(&field.key, field.options[next].clone());
    }

    /// Required fields must be non-blank
    pub fn validate(&self) -> Result<(), String> {
        for field in self.fields() {
            if field.required
                && field.kind != FieldKind::Flag
                && self.values.line(&field.key).is_empty()
            {
                return Err(format!("{} is required", field.label));
            }
        }
        Ok(())
    }

    pub fn begin_submit(&mut self, seq: u64) {
        self.submitting = true;
        self.submit_seq = Some(seq);
        self.error = None;
    }

    /// A submission failed: unlock the form, keeping what was entered
    pub fn fail(&mut self, message: String) {
        self.submitting = false;
        self.submit_seq = None;
        self.error = Some(message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::{ContentBlock, NotificationTemplate, TemplateType};

    fn block() -> ContentBlock {
        ContentBlock {
            id: 1,
            key: "intro".to_string(),
            category: "content".to_string(),
            title: "Intro".to_string(),
            html_content: "<p/>".to_string(),
            description: None,
            variables: Vec::new(),
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn test_edit_locks_natural_key() {
        let mut form = FormState::edit(block());
        assert_eq!(form.focused().map(|f| f.key.as_str()), Some("category"));

        form.focus = 0;
        form.input('x');
        form.backspace();
        assert_eq!(form.values.text("key"), "intro");
    }

    #[test]
    fn test_focus_skips_locked_fields() {
        let mut form = FormState::edit(block());
        let len = form.fields().len();
        for _ in 0..len {
            form.focus_next();
            assert_ne!(form.focused().map(|f| f.key.as_str()), Some("key"));
        }
    }

    #[test]
    fn test_typing_and_validation() {
        let mut form: FormState<ContentBlock> = FormState::create();
        assert_eq!(form.focused().map(|f| f.key.as_str()), Some("key"));
        assert_eq!(form.validate().unwrap_err(), "Key is required");

        for c in "tour_step1".chars() {
            form.input(c);
        }
        assert_eq!(form.values.text("key"), "tour_step1");
        assert_eq!(form.validate().unwrap_err(), "Title is required");
    }

    #[test]
    fn test_multiline_enter_adds_newline() {
        let mut form: FormState<ContentBlock> = FormState::create();
        form.focus = form
            .fields()
            .iter()
            .position(|f| f.key == "html_content")
            .unwrap();
        form.input('a');
        form.enter();
        form.input('b');
        assert_eq!(form.values.text("html_content"), "a\nb");
    }

    #[test]
    fn test_choice_cycles_on_create_only() {
        let mut form: FormState<NotificationTemplate> = FormState::create();
        form.focus = 1;
        assert_eq!(form.values.text("template_type"), "email");
        form.toggle();
        assert_eq!(form.values.text("template_type"), "slack");
        form.cycle_choice(true);
        assert_eq!(form.values.text("template_type"), "email");

        let template = NotificationTemplate {
            id: 2,
            name: "n".to_string(),
            template_type: TemplateType::Slack,
            category: "ops".to_string(),
            subject_template: None,
            body_template: "b".to_string(),
            is_active: true,
            is_default: false,
            variables: Vec::new(),
            created_at: None,
            updated_at: None,
        };
        let mut form = FormState::edit(template);
        form.focus = 1;
        form.toggle();
        assert_eq!(form.values.text("template_type"), "slack");
    }

    #[test]
    fn test_failed_submit_unlocks_and_keeps_values() {
        let mut form: FormState<ContentBlock> = FormState::create();
        form.input('k');
        form.begin_submit(4);
        form.input('z');
        assert_eq!(form.values.text("key"), "k");

        form.fail("Key already exists".to_string());
        assert!(!form.submitting);
        assert_eq!(form.error.as_deref(), Some("Key already exists"));
        assert_eq!(form.values.text("key"), "k");
    }
}
