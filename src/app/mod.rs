pub mod renderer;

use std::{
    cell::Cell,
    io::{Stdout, Write},
    rc::Rc,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
        mpsc::{RecvTimeoutError, Sender},
    },
    time::{Duration, Instant},
};

use crossterm::{
    ExecutableCommand, QueueableCommand, cursor,
    event::{self, KeyCode},
    queue,
    style::{self, Attribute, Color, Stylize},
    terminal::{self, ClearType},
};

use crate::{
    app::renderer::{MAX_ZOOM, MIN_ZOOM, NUM_STATUS_ROWS, TerminalRenderer},
    controller::{Controller, ControllerConfig, GenerationAlgorithm, Settings, SolveAlgorithm},
    frame_task::{Completion, TaskOutcome},
};

/// How often the controller is ticked. A frame runs on the first tick after the 60 fps cap
/// allows it, so coarser ticks would stretch every frame.
const TICK_INTERVAL: Duration = Duration::from_millis(1);
/// Timeout for polling input events in the input thread, a.k.a. how often it checks for exit
const USER_INPUT_EVENT_POLL_TIMEOUT: Duration = Duration::from_millis(100);
const ZOOM_STEP: f64 = 1.0;

enum UserInputEvent {
    KeyPress(event::KeyEvent),
    Resize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum UserAction {
    Generate,
    Solve,
    Clear,
    ToggleAnimation,
    TogglePause,
    ZoomIn,
    ZoomOut,
    Resize,
    Exit,
}

impl UserAction {
    fn from_input(event: UserInputEvent) -> Option<UserAction> {
        let key_event = match event {
            UserInputEvent::Resize => return Some(UserAction::Resize),
            UserInputEvent::KeyPress(key_event) => key_event,
        };
        match key_event.code {
            KeyCode::Char('g') => Some(UserAction::Generate),
            KeyCode::Char('s') => Some(UserAction::Solve),
            KeyCode::Char('c') => Some(UserAction::Clear),
            KeyCode::Char('a') => Some(UserAction::ToggleAnimation),
            KeyCode::Char('p') => Some(UserAction::TogglePause),
            KeyCode::Char('+') | KeyCode::Char('=') => Some(UserAction::ZoomIn),
            KeyCode::Char('-') => Some(UserAction::ZoomOut),
            KeyCode::Esc => Some(UserAction::Exit),
            _ => None,
        }
    }
}

/// What the status line says about the last request.
struct Activity {
    label: &'static str,
    completion: Completion,
}

impl Activity {
    fn describe(&self) -> String {
        match self.completion.outcome() {
            None => format!("{}...", self.label),
            Some(TaskOutcome::Completed) => format!("{}: done", self.label),
            Some(TaskOutcome::Cancelled) => format!("{}: cancelled", self.label),
            Some(TaskOutcome::Superseded) => format!("{}: superseded", self.label),
        }
    }
}

/// Set a panic hook to restore terminal state on panic
/// This ensures that the terminal is not left in raw mode or alternate screen on panic
/// even if the panic occurs in a different thread
fn set_panic_hook() {
    let hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = restore_terminal(&mut std::io::stdout()); // ignore any errors as we are already failing
        hook(panic_info);
    }));
}

/// Setup terminal in raw mode and enter alternate screen
/// Also sets a panic hook to restore terminal on panic
pub fn setup_terminal(stdout: &mut Stdout) -> std::io::Result<()> {
    terminal::enable_raw_mode()?;
    set_panic_hook();
    queue!(
        stdout,
        terminal::EnterAlternateScreen,
        terminal::Clear(ClearType::All),
        cursor::Hide,
        cursor::MoveTo(0, 0)
    )?;
    stdout.flush()?;
    Ok(())
}

/// Restore terminal to original state
/// Leave alternate screen and disable raw mode
pub fn restore_terminal(stdout: &mut Stdout) -> std::io::Result<()> {
    queue!(
        stdout,
        style::ResetColor,
        terminal::LeaveAlternateScreen,
        cursor::Show
    )?;
    stdout.flush()?;
    terminal::disable_raw_mode()?;
    Ok(())
}

/// Entry point of the terminal app: asks for settings, then hands the terminal to the
/// controller until Esc is pressed.
pub fn run(stdout: &mut Stdout) -> std::io::Result<()> {
    let Some((rows, cols)) = ask_maze_dimensions(stdout)? else {
        return Ok(());
    };

    let Some(generation_algorithm) = select_from_menu(
        stdout,
        "Select maze generation algorithm (use arrow keys and Enter, or Esc to exit):",
        &GenerationAlgorithm::ALL,
    )?
    else {
        return Ok(());
    };
    stdout.execute(style::PrintStyledContent(
        format!("Selected generator: {}\r\n", generation_algorithm)
            .with(Color::Green)
            .attribute(Attribute::Bold),
    ))?;

    let Some(solve_algorithm) = select_from_menu(
        stdout,
        "Select maze solving algorithm (use arrow keys and Enter, or Esc to exit):",
        &SolveAlgorithm::ALL,
    )?
    else {
        return Ok(());
    };

    let mut settings = Settings {
        rows,
        cols,
        generation_algorithm,
        solve_algorithm,
        ..Settings::default()
    };
    if let Err(e) = settings.validate() {
        // The prompts only accept valid values, so this is a bug rather than user error
        tracing::error!("Rejected settings: {e}");
        return Ok(());
    }
    tracing::info!(?settings, "Settings chosen");

    let exit = Arc::new(AtomicBool::new(false));
    let (user_input_event_tx, user_input_event_rx) = std::sync::mpsc::channel::<UserInputEvent>();
    let exit_for_input = exit.clone();
    // Spawn a thread to listen for user input
    let input_thread_handle = std::thread::spawn(move || -> std::io::Result<()> {
        listen_to_user_input(
            user_input_event_tx,
            USER_INPUT_EVENT_POLL_TIMEOUT,
            &exit_for_input,
        )
    });

    let solvable = Rc::new(Cell::new(false));
    let solvable_for_controller = solvable.clone();
    let defaults = Settings::default();
    let mut controller = Controller::new(
        TerminalRenderer::new(defaults.rows, defaults.cols, defaults.cell_wall_ratio),
        ControllerConfig::default(),
    )
    .with_solvable_callback(move |value| solvable_for_controller.set(value));

    queue!(stdout, terminal::Clear(ClearType::All), cursor::Hide)?;
    stdout.flush()?;
    controller.redraw();
    let mut activity = Some(Activity {
        label: "Generating",
        completion: controller.generate(&settings),
    });

    tracing::info!("Started main app loop");
    let result = loop {
        let action = match user_input_event_rx.recv_timeout(TICK_INTERVAL) {
            Ok(event) => UserAction::from_input(event),
            Err(RecvTimeoutError::Timeout) => None,
            // Input thread has exited
            Err(RecvTimeoutError::Disconnected) => break Ok(()),
        };

        match action {
            Some(UserAction::Exit) => break Ok(()),
            Some(UserAction::Generate) => {
                activity = Some(Activity {
                    label: "Generating",
                    completion: controller.generate(&settings),
                });
            }
            // Solving is only offered once a maze is complete
            Some(UserAction::Solve) if solvable.get() => match controller.solve(&settings) {
                Ok(completion) => {
                    activity = Some(Activity {
                        label: "Solving",
                        completion,
                    })
                }
                Err(e) => tracing::warn!("Cannot solve: {e}"),
            },
            Some(UserAction::Solve) => {}
            Some(UserAction::Clear) => {
                activity = Some(Activity {
                    label: "Clearing",
                    completion: controller.clear(),
                });
            }
            Some(UserAction::ToggleAnimation) => {
                settings.animate_generating = !settings.animate_generating;
                settings.animate_solving = settings.animate_generating;
            }
            Some(UserAction::TogglePause) => {
                if controller.is_paused() {
                    controller.unpause();
                } else {
                    controller.pause();
                }
            }
            Some(UserAction::ZoomIn) => {
                let zoom = controller.renderer().zoom() + ZOOM_STEP;
                controller.zoom_to(zoom.min(MAX_ZOOM));
            }
            Some(UserAction::ZoomOut) => {
                let zoom = controller.renderer().zoom() - ZOOM_STEP;
                controller.zoom_to(zoom.max(MIN_ZOOM));
            }
            Some(UserAction::Resize) => controller.redraw(),
            None => {}
        }

        controller.tick(Instant::now());

        let status = status_segments(&settings, solvable.get(), controller.is_paused(), &activity);
        controller.renderer_mut().set_status(status);
        if let Some(e) = controller.renderer_mut().take_error() {
            break Err(e);
        }
    };
    tracing::info!("Exiting main app loop");

    // Tell the input thread to stop, and wait for it
    exit.store(true, Ordering::Relaxed);
    drop(user_input_event_rx);
    match input_thread_handle.join() {
        Ok(input_result) => input_result?,
        Err(_) => tracing::error!("Input thread panicked"),
    }
    result
}

/// Status line contents, most important first.
fn status_segments(
    settings: &Settings,
    solvable: bool,
    paused: bool,
    activity: &Option<Activity>,
) -> Vec<String> {
    let mut segments = Vec::new();
    if let Some(activity) = activity {
        segments.push(activity.describe());
    }
    if paused {
        segments.push("PAUSED".to_string());
    }
    segments.push(format!("{}x{}", settings.rows, settings.cols));
    segments.push("[g] generate".to_string());
    if solvable {
        segments.push("[s] solve".to_string());
    }
    segments.push("[c] clear".to_string());
    let animation = if settings.animate_generating { "on" } else { "off" };
    segments.push(format!("[a] animation: {animation}"));
    segments.push("[p] pause".to_string());
    segments.push("[+/-] zoom".to_string());
    segments.push("[Esc] exit".to_string());
    segments
}

/// Listen for user input events (key presses and resize)
/// This function runs in a separate thread, and is the only place where user input is read
fn listen_to_user_input(
    user_input_event_tx: Sender<UserInputEvent>,
    event_poll_timeout: Duration,
    exit: &AtomicBool,
) -> std::io::Result<()> {
    loop {
        if exit.load(Ordering::Relaxed) {
            return Ok(());
        }

        // Poll for events with a timeout
        if !event::poll(event_poll_timeout)? {
            // No event available, continue loop to check the exit flag again
            continue;
        }

        // We only care about key presses and resizes
        let input_event = match event::read()? {
            event::Event::Key(key_event) if key_event.kind == event::KeyEventKind::Press => {
                UserInputEvent::KeyPress(key_event)
            }
            event::Event::Resize(_, _) => UserInputEvent::Resize,
            _ => continue, // Ignore other events
        };

        // Should exit input thread on Esc key
        let should_exit = matches!(
            input_event,
            UserInputEvent::KeyPress(event::KeyEvent {
                code: KeyCode::Esc,
                ..
            })
        );

        // Send the input event to the main thread
        if user_input_event_tx.send(input_event).is_err() {
            // Receiver has been dropped, exit the thread
            return Ok(());
        }

        if should_exit {
            tracing::debug!("[input loop] Esc key pressed, exiting");
            return Ok(());
        }
    }
}

/// Get user input with real-time validation and feedback
/// Returns None if user cancels input with Esc
/// Returns Some(T) if user inputs a valid input and presses Enter, where T is the validated type
fn prompt_with_validation<F, T>(
    stdout: &mut Stdout,
    prompt: &str,
    validate: F,
) -> std::io::Result<Option<T>>
where
    F: Fn(&str) -> Result<T, String>,
{
    // Save cursor position so we can restore / redraw
    queue!(stdout, cursor::Hide, cursor::SavePosition)?;
    stdout.flush()?;

    let mut input = String::new();

    let value = loop {
        // Re-render prompt line
        queue!(
            stdout,
            cursor::RestorePosition,
            terminal::Clear(ClearType::FromCursorDown)
        )?;

        stdout.queue(style::PrintStyledContent(
            prompt.with(Color::Cyan).attribute(Attribute::Bold),
        ))?;

        // Decide color based on validity
        let validation_result = validate(input.trim());
        let color = if validation_result.is_ok() {
            Color::Green
        } else {
            Color::Red
        };
        queue!(
            stdout,
            style::SetForegroundColor(color),
            style::Print(&input),
            style::ResetColor,
            style::Print(" \r\n")
        )?;

        // Error message line (if any)
        if let Err(msg) = validation_result {
            stdout.queue(style::PrintStyledContent(
                msg.with(Color::DarkGrey).attribute(Attribute::Dim),
            ))?;
        }

        stdout.flush()?;

        if let event::Event::Key(event::KeyEvent { code, kind, .. }) = event::read()? {
            if kind != event::KeyEventKind::Press {
                continue;
            }
            match code {
                KeyCode::Enter => {
                    if let Ok(value) = validate(input.trim()) {
                        break Some(value);
                    }
                }
                KeyCode::Char(c) if !c.is_whitespace() && !c.is_control() => input.push(c),
                KeyCode::Backspace => {
                    input.pop();
                }
                KeyCode::Esc => break None,
                _ => {}
            }
        }
    };
    // Cleanup
    queue!(
        stdout,
        cursor::RestorePosition,
        terminal::Clear(ClearType::FromCursorDown),
        cursor::Show
    )?;
    stdout.flush()?;

    Ok(value)
}

/// Largest maze size along one axis that fits in `term_size` terminal cells at the smallest
/// zoom, with walls and cells one unit each.
fn get_max_maze_size(term_size: u16, unit_size: u16) -> u16 {
    let units = term_size / unit_size;
    // n cells take 2n + 1 units
    (units.saturating_sub(1) / 2).clamp(Settings::DIMS_RANGE.min_size, Settings::DIMS_RANGE.max_size)
}

/// Parses a maze size, falling back to `max_size` on empty input.
fn parse_maze_size(s: &str, max_size: u16) -> Result<u16, String> {
    if s.is_empty() {
        return Ok(max_size);
    }
    let min_size = Settings::DIMS_RANGE.min_size;
    let error_msg = format!("Please enter a number between {min_size} and {max_size}.");
    s.parse::<u16>()
        .map_err(|_| error_msg.clone())
        .and_then(|n| if (min_size..=max_size).contains(&n) { Ok(n) } else { Err(error_msg) })
}

/// Ask user for maze dimensions (rows and columns)
/// Returns None if user cancels input with Esc
fn ask_maze_dimensions(stdout: &mut Stdout) -> std::io::Result<Option<(u16, u16)>> {
    stdout.execute(style::PrintStyledContent(
        "Enter maze dimensions, or press Esc to exit. Leave empty for the largest maze that \
fits the terminal. Larger mazes are clipped.\r\n"
            .with(Color::Blue),
    ))?;

    let max_size = |is_rows: bool| match terminal::size() {
        Ok((_, term_height)) if is_rows => {
            get_max_maze_size(term_height.saturating_sub(NUM_STATUS_ROWS), 1)
        }
        Ok((term_width, _)) => get_max_maze_size(term_width, 2),
        // Fallback to the largest accepted size if terminal size cannot be determined
        Err(_) => Settings::DIMS_RANGE.max_size,
    };

    let Some(rows) = prompt_with_validation(stdout, "Rows: ", |s| {
        parse_maze_size(s, max_size(true))
    })?
    else {
        return Ok(None);
    };
    stdout.execute(style::PrintStyledContent(
        format!("Rows set to {}\r\n", rows)
            .with(Color::Green)
            .attribute(Attribute::Bold),
    ))?;

    let Some(cols) = prompt_with_validation(stdout, "Columns: ", |s| {
        parse_maze_size(s, max_size(false))
    })?
    else {
        return Ok(None);
    };
    stdout.execute(style::PrintStyledContent(
        format!("Columns set to {}\r\n", cols)
            .with(Color::Green)
            .attribute(Attribute::Bold),
    ))?;

    Ok(Some((rows, cols)))
}

/// Present a menu of options to the user and let them select one using arrow keys
/// Returns None if user cancels input with Esc
/// Returns Some(T) if user selects an option and presses Enter, where T is the option type
fn select_from_menu<T: std::fmt::Display + Copy>(
    stdout: &mut Stdout,
    prompt: &str,
    options: &[T],
) -> std::io::Result<Option<T>> {
    if options.is_empty() {
        return Ok(None);
    }

    // Save cursor position so we can restore / redraw
    queue!(stdout, cursor::Hide, cursor::SavePosition)?;

    let mut selected = 0;

    let selected_option = loop {
        // Re-render prompt line
        queue!(
            stdout,
            cursor::RestorePosition,
            terminal::Clear(ClearType::FromCursorDown)
        )?;

        stdout.queue(style::PrintStyledContent(prompt.with(Color::Yellow)))?;

        for (i, option) in options.iter().enumerate() {
            if i == selected {
                stdout.queue(style::SetAttribute(Attribute::Reverse))?;
            }
            stdout.queue(style::Print(format!("\r\n{}", option)))?;
            if i == selected {
                stdout.queue(style::SetAttribute(Attribute::NoReverse))?;
            }
        }
        stdout.queue(style::Print("\r\n"))?;

        stdout.flush()?;

        // Wait for key event
        if let event::Event::Key(event::KeyEvent { code, kind, .. }) = event::read()? {
            if kind != event::KeyEventKind::Press {
                // Only handle key press events
                continue;
            }
            match code {
                KeyCode::Up => {
                    selected = match selected {
                        0 => options.len() - 1,
                        _ => selected - 1,
                    };
                }
                KeyCode::Down => {
                    selected = if selected >= options.len() - 1 {
                        0
                    } else {
                        selected + 1
                    };
                }
                KeyCode::Enter => {
                    break Some(options[selected]);
                }
                KeyCode::Esc => {
                    // User cancelled input
                    break None;
                }
                _ => {}
            }
        }
    };
    // Cleanup
    queue!(
        stdout,
        cursor::RestorePosition,
        terminal::Clear(ClearType::FromCursorDown),
        cursor::Show
    )?;
    stdout.flush()?;

    Ok(selected_option)
}
