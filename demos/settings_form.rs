//! Example demonstrating the Settings Plugin
//!
//! A small form bound to persisted user settings: a username field, a
//! subscription toggle, a launch counter and a reset button. Values survive
//! restarts; run it twice to see the launch count carry over.

use iced::widget::{button, column, container, row, text, text_input, toggler};
use iced::{Element, Length, Subscription, Task};
use iced_settings_plugin::SettingsManager;
use iced_user_defaults::{AppName, Defaults, DefaultsError};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let settings = open_settings()?;

    iced::application(move || App::new(settings.clone()), App::update, App::view)
        .subscription(App::subscription)
        .run()?;
    Ok(())
}

fn open_settings() -> Result<SettingsManager, DefaultsError> {
    let app_name = AppName::new("com", "nrjais", "settings_demo");

    SettingsManager::open(&app_name).or_else(|e| {
        tracing::warn!(error = %e, "Falling back to in-memory settings");
        SettingsManager::new(Defaults::in_memory())
    })
}

struct App {
    settings: SettingsManager,
    status_message: String,
}

#[derive(Debug, Clone)]
enum Message {
    UsernameChanged(String),
    SubscribedToggled(bool),
    IncrementLaunchCount,
    ResetAll,
    SettingsChanged,
}

impl App {
    fn new(settings: SettingsManager) -> (App, Task<Message>) {
        (
            App {
                settings,
                status_message: "Ready".to_string(),
            },
            Task::none(),
        )
    }

    fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::UsernameChanged(value) => {
                self.settings.set_username(value);
            }

            Message::SubscribedToggled(value) => {
                self.settings.set_is_subscribed(value);
            }

            Message::IncrementLaunchCount => {
                self.settings.increment_launch_count();
            }

            Message::ResetAll => {
                self.settings.reset_all();
                self.status_message = "All settings reset".to_string();
            }

            Message::SettingsChanged => {
                // The view reads straight from the settings, nothing to copy.
                tracing::debug!("Settings changed");
            }
        }

        Task::none()
    }

    fn view(&self) -> Element<'_, Message> {
        let title = text("User Settings").size(32);

        let status = text(format!("Status: {}", self.status_message)).size(14);

        let username = self.settings.username();
        let user_section = column![
            text("User Information").size(20),
            row![
                text("Username:").width(120),
                text_input("Username", &username)
                    .on_input(Message::UsernameChanged)
                    .width(220),
            ]
            .spacing(10),
            toggler(self.settings.is_subscribed())
                .label("Subscribed")
                .on_toggle(Message::SubscribedToggled),
        ]
        .spacing(10);

        let app_section = column![
            text("App Information").size(20),
            text(format!("Launch Count: {}", self.settings.launch_count())),
            button("Increment Launch Count").on_press(Message::IncrementLaunchCount),
        ]
        .spacing(10);

        let content = column![
            title,
            status,
            user_section,
            app_section,
            button("Reset All").on_press(Message::ResetAll),
        ]
        .spacing(20)
        .padding(20);

        container(content)
            .width(Length::Fill)
            .height(Length::Fill)
            .into()
    }

    fn subscription(&self) -> Subscription<Message> {
        self.settings.listen().map(|_| Message::SettingsChanged)
    }
}
