//! TUI rendering using ratatui.

use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use ratatui::Frame;

use mealplan_core::{RequestState, RequestStatus};

use super::app::{App, DisplayMode, View};

/// Render the current view.
pub fn render(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(3),    // main content
            Constraint::Length(1), // status bar
        ])
        .split(f.area());

    let state = app.state();
    match app.current_view {
        View::Main => render_main(f, app, &state, chunks[0]),
        View::Help => render_help(f, chunks[0]),
    }

    render_status_bar(f, app, &state, chunks[1]);
}

fn render_main(f: &mut Frame, app: &mut App, state: &RequestState, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4), // user + endpoint + button
            Constraint::Length(3), // status
            Constraint::Min(3),    // result
        ])
        .split(area);

    let header_text = vec![
        Line::from(vec![
            Span::styled("User: ", Style::default().fg(Color::Yellow)),
            Span::raw(app.requester.user_id().to_string()),
            Span::styled("  Endpoint: ", Style::default().fg(Color::Yellow)),
            Span::raw(app.endpoint.clone()),
        ]),
        Line::from(button(state)),
    ];
    let header = Paragraph::new(header_text).block(
        Block::default()
            .borders(Borders::ALL)
            .title(" Meal Plan "),
    );
    f.render_widget(header, chunks[0]);

    let status = Paragraph::new(Line::from(vec![
        Span::styled("Status: ", Style::default().fg(Color::Yellow)),
        status_colored(state.status()),
    ]))
    .block(Block::default().borders(Borders::ALL));
    f.render_widget(status, chunks[1]);

    let title = if state.is_loading() {
        " Loading... ".to_string()
    } else {
        " Result ".to_string()
    };
    let block = Block::default().borders(Borders::ALL).title(title);
    let inner = block.inner(chunks[2]);
    let result = Paragraph::new(result_body(app.display, state)).wrap(Wrap { trim: false });
    app.set_result_viewport(result.line_count(inner.width), inner.height);
    f.render_widget(result.scroll((app.scroll, 0)).block(block), chunks[2]);
}

fn button(state: &RequestState) -> Span<'static> {
    let style = if state.is_loading() {
        Style::default().fg(Color::DarkGray)
    } else {
        Style::default()
            .fg(Color::Black)
            .bg(Color::Green)
            .add_modifier(Modifier::BOLD)
    };
    Span::styled("[ Generate Meal Plan ]", style)
}

/// Text shown in the result panel.
fn result_body(display: DisplayMode, state: &RequestState) -> String {
    match (state.status(), display) {
        (RequestStatus::Idle, _) => "Press g to generate a meal plan.".to_string(),
        (RequestStatus::Loading, _) => String::new(),
        (RequestStatus::Succeeded, DisplayMode::Discard) => "Meal plan generated.".to_string(),
        (RequestStatus::Failed, DisplayMode::Discard) => "Meal plan request failed.".to_string(),
        (_, DisplayMode::ShowResult) => state.result_text().unwrap_or_default().to_string(),
    }
}

fn render_help(f: &mut Frame, area: Rect) {
    let text = vec![
        Line::from(""),
        Line::from(vec![
            Span::styled("  Actions", Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)),
        ]),
        Line::from("    g/Enter   Generate a meal plan"),
        Line::from(""),
        Line::from(vec![
            Span::styled("  Navigation", Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)),
        ]),
        Line::from("    j/Down    Scroll result down"),
        Line::from("    k/Up      Scroll result up"),
        Line::from("    Esc/q     Back / Quit"),
        Line::from("    Ctrl-C    Quit"),
        Line::from(""),
        Line::from(vec![
            Span::styled("  Other", Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)),
        ]),
        Line::from("    ?         Show this help"),
        Line::from(""),
    ];

    let help = Paragraph::new(text).block(
        Block::default()
            .borders(Borders::ALL)
            .title(" Help "),
    );
    f.render_widget(help, area);
}

fn render_status_bar(f: &mut Frame, app: &App, state: &RequestState, area: Rect) {
    let view_name = match app.current_view {
        View::Main => "Meal Plan",
        View::Help => "Help",
    };

    let message = match (&app.status_message, state.status()) {
        (Some(msg), _) => Span::styled(msg.clone(), Style::default().fg(Color::Green)),
        (None, RequestStatus::Failed) => Span::styled(
            state.result_text().unwrap_or_default().to_string(),
            Style::default().fg(Color::Red),
        ),
        (None, _) => Span::raw(""),
    };

    let bar = Line::from(vec![
        Span::styled(
            format!(" {view_name} "),
            Style::default().bg(Color::Blue).fg(Color::White),
        ),
        Span::raw("  "),
        status_colored(state.status()),
        Span::raw("  "),
        message,
        Span::raw("  g:generate  q:quit  ?:help"),
    ]);

    f.render_widget(Paragraph::new(bar), area);
}

// -- Helpers --

fn status_colored(status: RequestStatus) -> Span<'static> {
    let color = match status {
        RequestStatus::Idle => Color::DarkGray,
        RequestStatus::Loading => Color::Blue,
        RequestStatus::Succeeded => Color::Green,
        RequestStatus::Failed => Color::Red,
    };
    Span::styled(status.to_string(), Style::default().fg(color))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;
    use serde_json::{Value, json};

    use mealplan_core::backend::{BackendError, HealthStatus, MealPlanBackend, MealPlanHistory};
    use mealplan_core::{MealPlanRequester, UserId};

    use super::*;

    struct FixedBackend(Result<Value, u16>);

    #[async_trait]
    impl MealPlanBackend for FixedBackend {
        async fn generate(&self, _user_id: &UserId) -> Result<Value, BackendError> {
            match &self.0 {
                Ok(payload) => Ok(payload.clone()),
                Err(status) => Err(BackendError::Status {
                    status: *status,
                    detail: Some("User not found".to_string()),
                }),
            }
        }

        async fn history(&self, _user_id: &UserId, _limit: u32) -> Result<MealPlanHistory, BackendError> {
            Err(BackendError::Decode("unused".to_string()))
        }

        async fn health(&self) -> Result<HealthStatus, BackendError> {
            Err(BackendError::Decode("unused".to_string()))
        }
    }

    fn app(payload: Value, display: DisplayMode) -> App {
        app_with(FixedBackend(Ok(payload)), display)
    }

    fn app_with(backend: FixedBackend, display: DisplayMode) -> App {
        let requester = MealPlanRequester::new(UserId::new("Hassan").unwrap(), Arc::new(backend));
        App::new(
            Arc::new(requester),
            "http://localhost:8000/mealplan/generate/Hassan".to_string(),
            display,
        )
    }

    fn draw(app: &mut App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(80, 20)).unwrap();
        terminal.draw(|f| render(f, app)).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn idle_screen_shows_button_and_prompt() {
        let screen = draw(&mut app(json!({}), DisplayMode::ShowResult));
        assert!(screen.contains("[ Generate Meal Plan ]"));
        assert!(screen.contains("idle"));
        assert!(screen.contains("Press g to generate"));
        assert!(screen.contains("User: Hassan"));
    }

    #[tokio::test]
    async fn loading_screen_has_empty_result() {
        let mut app = app(json!({"meal_plan": "Mon: oats"}), DisplayMode::ShowResult);
        let _handle = app.requester.trigger();

        let screen = draw(&mut app);
        assert!(screen.contains("Loading..."));
        assert!(screen.contains("loading"));
        assert!(!screen.contains("Mon: oats"));
    }

    #[tokio::test]
    async fn result_is_rendered_after_success() {
        let mut app = app(json!({"meal_plan": "Mon: oats"}), DisplayMode::ShowResult);
        app.requester.generate_meal_plan().await;

        let screen = draw(&mut app);
        assert!(screen.contains("succeeded"));
        assert!(screen.contains("Mon: oats"));
    }

    #[tokio::test]
    async fn discard_mode_hides_result() {
        let mut app = app(json!({"meal_plan": "Mon: oats"}), DisplayMode::Discard);
        app.requester.generate_meal_plan().await;

        let screen = draw(&mut app);
        assert!(screen.contains("Meal plan generated."));
        assert!(!screen.contains("Mon: oats"));
    }

    #[test]
    fn help_view_lists_keys() {
        let mut app = app(json!({}), DisplayMode::ShowResult);
        app.show_help();
        let screen = draw(&mut app);
        assert!(screen.contains("Generate a meal plan"));
    }

    #[tokio::test]
    async fn long_single_line_plan_scrolls_to_its_end() {
        let mut plan = (0..60)
            .map(|i| format!("Day {i}: eat a balanced plate of greens and grains."))
            .collect::<Vec<_>>()
            .join(" ");
        plan.push_str(" END-OF-PLAN");
        let mut app = app(json!({ "meal_plan": plan }), DisplayMode::ShowResult);
        app.requester.generate_meal_plan().await;

        let screen = draw(&mut app);
        assert!(!screen.contains("END-OF-PLAN"));

        for _ in 0..100 {
            app.scroll_down();
        }
        assert!(app.scroll > 0);
        let screen = draw(&mut app);
        assert!(screen.contains("END-OF-PLAN"), "scroll={}", app.scroll);
    }

    #[tokio::test]
    async fn failure_message_is_shown_in_status_bar_when_discarding() {
        let mut app = app_with(FixedBackend(Err(404)), DisplayMode::Discard);
        app.requester.generate_meal_plan().await;

        let screen = draw(&mut app);
        assert!(screen.contains("Meal plan request failed."));
        assert!(screen.contains("HTTP 404: User not found"));
    }
}
