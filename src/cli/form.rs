//! Interactive converter form.
//!
//! Keys are read on a dedicated thread and merged with converter state
//! updates in one loop; every event redraws the whole form.

use super::ui::{self, StyleType};
use crate::core::amount::accepts_amount_text;
use crate::core::config::ConverterConfig;
use crate::core::picker::{NO_RESULTS, display_text};
use crate::core::{
    Catalog, ConvertError, Converter, ConverterSession, ConverterView, CurrencyPicker, Input,
    PickerKey, RateService,
};
use anyhow::{Context, Result, bail};
use console::{Key, Term};
use std::io;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info};

const LIST_ROWS: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Amount,
    From,
    To,
    Swap,
}

impl Focus {
    fn next(self) -> Self {
        match self {
            Focus::Amount => Focus::From,
            Focus::From => Focus::To,
            Focus::To => Focus::Swap,
            Focus::Swap => Focus::Amount,
        }
    }

    fn prev(self) -> Self {
        match self {
            Focus::Amount => Focus::Swap,
            Focus::From => Focus::Amount,
            Focus::To => Focus::From,
            Focus::Swap => Focus::To,
        }
    }
}

#[derive(Debug, PartialEq)]
pub enum FormAction {
    Nothing,
    Send(Input),
    Quit,
}

/// Presentation state: the amount text as typed, focus, and both pickers.
#[derive(Debug)]
pub struct Form {
    amount: String,
    focus: Focus,
    from_picker: CurrencyPicker,
    to_picker: CurrencyPicker,
}

impl Default for Form {
    fn default() -> Self {
        Self::new()
    }
}

impl Form {
    pub fn new() -> Self {
        Form {
            amount: String::new(),
            focus: Focus::Amount,
            from_picker: CurrencyPicker::new(),
            to_picker: CurrencyPicker::new(),
        }
    }

    pub fn focus(&self) -> Focus {
        self.focus
    }

    pub fn amount(&self) -> &str {
        &self.amount
    }

    fn move_focus(&mut self, to: Focus) {
        // leaving a picker is a click outside it
        match self.focus {
            Focus::From => self.from_picker.dismiss(),
            Focus::To => self.to_picker.dismiss(),
            _ => {}
        }
        self.focus = to;
    }

    pub fn handle_key(&mut self, key: Key, view: &ConverterView, catalog: &Catalog) -> FormAction {
        match key {
            Key::CtrlC => return FormAction::Quit,
            Key::Tab => {
                self.move_focus(self.focus.next());
                return FormAction::Nothing;
            }
            Key::BackTab => {
                self.move_focus(self.focus.prev());
                return FormAction::Nothing;
            }
            _ => {}
        }

        match self.focus {
            Focus::Amount => self.amount_key(key),
            Focus::From | Focus::To => self.picker_key(key, view, catalog),
            Focus::Swap => match key {
                Key::Escape => FormAction::Quit,
                Key::Enter | Key::Char(' ') if !view.loading => FormAction::Send(Input::Swap),
                _ => FormAction::Nothing,
            },
        }
    }

    fn amount_key(&mut self, key: Key) -> FormAction {
        let mut text = self.amount.clone();
        match key {
            Key::Escape => return FormAction::Quit,
            Key::Char(c) => text.push(c),
            Key::Backspace => {
                if text.pop().is_none() {
                    return FormAction::Nothing;
                }
            }
            _ => return FormAction::Nothing,
        }
        if !accepts_amount_text(&text) {
            debug!(%text, "Rejected amount keystroke");
            return FormAction::Nothing;
        }
        self.amount = text.clone();
        FormAction::Send(Input::Amount(text))
    }

    fn picker_key(&mut self, key: Key, view: &ConverterView, catalog: &Catalog) -> FormAction {
        let focus = self.focus;
        let picker = match focus {
            Focus::From => &mut self.from_picker,
            _ => &mut self.to_picker,
        };

        if !picker.is_open() && key == Key::Escape {
            return FormAction::Quit;
        }
        // disabled while a conversion is loading
        if view.loading && !picker.is_open() {
            return FormAction::Nothing;
        }

        let picker_key = match key {
            Key::Enter => PickerKey::Enter,
            Key::Char(' ') => PickerKey::Space,
            Key::Char(c) => PickerKey::Char(c),
            Key::ArrowUp => PickerKey::Up,
            Key::ArrowDown => PickerKey::Down,
            Key::Escape => PickerKey::Escape,
            Key::Backspace => PickerKey::Backspace,
            _ => return FormAction::Nothing,
        };

        match picker.handle_key(picker_key, catalog) {
            Some(code) if focus == Focus::From => FormAction::Send(Input::From(code)),
            Some(code) => FormAction::Send(Input::To(code)),
            None => FormAction::Nothing,
        }
    }

    pub fn render(&self, view: &ConverterView, catalog: &Catalog) -> String {
        let mut lines = vec![
            ui::style_text("Currency Converter", StyleType::Title),
            ui::style_text("Real-time exchange rates", StyleType::Subtle),
            String::new(),
        ];

        let cursor = if self.focus == Focus::Amount { "_" } else { "" };
        let amount = if self.amount.is_empty() && self.focus != Focus::Amount {
            ui::style_text("Enter amount", StyleType::Subtle)
        } else {
            format!("{}{cursor}", self.amount)
        };
        lines.push(self.field_line(Focus::Amount, "Amount", &format!("[{amount}]")));

        self.render_picker(&mut lines, Focus::From, "From", &view.from, catalog);
        self.render_picker(&mut lines, Focus::To, "To", &view.to, catalog);
        lines.push(self.field_line(Focus::Swap, "", "[⇅ Swap]"));
        lines.push(String::new());

        if let Some(error) = view.error {
            lines.push(ui::style_text(&error.to_string(), StyleType::Error));
        }
        if view.loading {
            lines.push(ui::style_text("Converting...", StyleType::Subtle));
        } else if let (Some(result), None) = (&view.result, view.error) {
            let mut result_lines = ui::conversion_lines(result, &view.from).into_iter();
            if let Some(headline) = result_lines.next() {
                lines.push(ui::style_text(&headline, StyleType::ResultValue));
            }
            lines.extend(result_lines.map(|l| ui::style_text(&l, StyleType::Subtle)));
        }

        lines.push(String::new());
        lines.push(ui::style_text(
            "Tab: next field · Enter/Space: open or select · Esc: close/quit",
            StyleType::Subtle,
        ));
        lines.push(ui::style_text("Powered by Frankfurter API", StyleType::Subtle));
        lines.join("\n")
    }

    fn field_line(&self, field: Focus, label: &str, value: &str) -> String {
        let label = format!("{label:<7}");
        if self.focus == field {
            format!(
                "{} {} {value}",
                ui::style_text("›", StyleType::Focused),
                ui::style_text(&label, StyleType::Focused)
            )
        } else {
            format!("  {} {value}", ui::style_text(&label, StyleType::Label))
        }
    }

    fn render_picker(
        &self,
        lines: &mut Vec<String>,
        field: Focus,
        label: &str,
        code: &str,
        catalog: &Catalog,
    ) {
        let picker = match field {
            Focus::From => &self.from_picker,
            _ => &self.to_picker,
        };
        let arrow = if picker.is_open() { "▴" } else { "▾" };
        let display = display_text(catalog, code);
        lines.push(self.field_line(field, label, &format!("[{display} {arrow}]")));
        if !picker.is_open() {
            return;
        }

        lines.push(format!("          Search: {}_", picker.filter()));
        let matches = picker.matches(catalog);
        if matches.is_empty() {
            lines.push(format!(
                "            {}",
                ui::style_text(NO_RESULTS, StyleType::Subtle)
            ));
            return;
        }

        let start = (picker.highlighted() + 1).saturating_sub(LIST_ROWS);
        for (index, (entry_code, name)) in matches.iter().enumerate().skip(start).take(LIST_ROWS)
        {
            let row = format!("{entry_code:<5}{name}");
            let row = if index == picker.highlighted() {
                format!("          › {}", ui::style_text(&row, StyleType::Focused))
            } else if *entry_code == code {
                format!("            {}", ui::style_text(&row, StyleType::Label))
            } else {
                format!("            {row}")
            };
            lines.push(row);
        }
    }
}

fn spawn_key_reader(term: Term) -> mpsc::UnboundedReceiver<Key> {
    let interactive = term.is_term();
    // raw reads deliver Ctrl-C as a key instead of raising SIGINT
    read_keys_on_thread(move || term.read_key_raw(), interactive)
}

/// Forwards keys until `read_key` fails or the receiver is dropped.
///
/// Off a terminal console answers every read with `Key::Unknown` without
/// blocking, so a non-interactive reader stops at the first one.
fn read_keys_on_thread<F>(mut read_key: F, interactive: bool) -> mpsc::UnboundedReceiver<Key>
where
    F: FnMut() -> io::Result<Key> + Send + 'static,
{
    let (tx, rx) = mpsc::unbounded_channel();
    // read_key blocks; a plain thread keeps runtime shutdown from waiting on it
    std::thread::spawn(move || {
        loop {
            match read_key() {
                Ok(Key::Unknown) if !interactive => {
                    debug!("Input is not a terminal, key reader stopped");
                    break;
                }
                Ok(key) => {
                    if tx.send(key).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    debug!(error = %e, "Key reader stopped");
                    break;
                }
            }
        }
    });
    rx
}

/// Runs the form until Quit or until the keys run out, handing each frame to `draw`.
async fn event_loop(
    form: &mut Form,
    session: &ConverterSession,
    keys: &mut mpsc::UnboundedReceiver<Key>,
    catalog: &Catalog,
    mut draw: impl FnMut(&str) -> Result<()>,
) -> Result<()> {
    let mut view_rx = session.subscribe();
    let mut view = view_rx.borrow_and_update().clone();
    draw(&form.render(&view, catalog))?;

    loop {
        tokio::select! {
            key = keys.recv() => {
                let Some(key) = key else { break };
                match form.handle_key(key, &view, catalog) {
                    FormAction::Quit => break,
                    FormAction::Send(input) => session.send(input)?,
                    FormAction::Nothing => {}
                }
            }
            changed = view_rx.changed() => {
                if changed.is_err() {
                    break;
                }
            }
        }
        view = view_rx.borrow_and_update().clone();
        draw(&form.render(&view, catalog))?;
    }
    Ok(())
}

pub async fn run(service: Arc<dyn RateService>, config: &ConverterConfig) -> Result<()> {
    let term = Term::stdout();
    if !term.is_term() {
        bail!("The converter form needs an interactive terminal; use `fxconv convert` instead");
    }

    let spinner = ui::new_spinner("Loading currencies...");
    let catalog = service.list_currencies().await;
    spinner.finish_and_clear();
    let catalog = catalog.context(ConvertError::CurrencyListLoad)?;
    info!(currencies = catalog.len(), "Loaded currency catalog");

    let session = ConverterSession::spawn(
        service,
        Converter::new(&config.from, &config.to),
        config.debounce(),
    );
    let mut keys = spawn_key_reader(term.clone());
    let mut form = Form::new();

    term.hide_cursor()?;
    let outcome = event_loop(&mut form, &session, &mut keys, &catalog, |screen| {
        term.clear_screen()?;
        term.write_line(screen)?;
        Ok(())
    })
    .await;

    // restore the terminal and stop the session whichever way the loop ended
    let restored = term.show_cursor();
    session.shutdown().await;
    outcome?;
    restored?;
    Ok(())
}
