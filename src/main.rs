use iced::widget::image::Handle;
use iced::widget::{button, column, container, row, text, Column};
use iced::{Alignment, Length};
use iced::{Element, Subscription, Task, Theme};
use rfd::FileDialog;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use image_slideshow::config::Config;
use image_slideshow::import::import_folder;
use image_slideshow::loader::{DefaultTransport, HttpTransport};
use image_slideshow::slideshow::{LoadTicket, PageState};
use image_slideshow::{Callback, FileImageSource, Image, ImageLoader, ImageSource, Slideshow};

mod ui;

/// Main application state
struct Viewer {
    slideshow: Slideshow,
    /// Shown while a page loads and when it fails
    placeholder: Option<Image>,
    /// Seconds between automatic page changes
    interval: Option<Duration>,
    /// Rendered handle for the current image, rebuilt only when the image changes
    shown: Option<(Image, Handle)>,
    /// Status message to display to the user
    status: String,
}

/// Application messages (events)
#[derive(Debug, Clone)]
enum Message {
    Previous,
    Next,
    /// Auto-advance timer fired
    Tick,
    /// User clicked the "Open Folder" button
    OpenFolder,
    /// Background folder scan finished
    FolderImported(Vec<FileImageSource>),
    /// A page load finished; the flag is false when only the placeholder came back
    PageLoaded(LoadTicket, bool),
}

impl Viewer {
    fn new(config: Config, loader: ImageLoader) -> (Self, Task<Message>) {
        let placeholder = config.placeholder();
        let sources = config.build_sources(placeholder.clone());
        let slideshow = Slideshow::new(sources, &loader, config.slideshow_options());

        info!(pages = slideshow.len(), "slideshow initialized");

        let status = if slideshow.is_empty() {
            "Ready. Open a folder to start.".to_string()
        } else {
            format!("Ready. {} images.", slideshow.len())
        };

        let mut viewer = Viewer {
            slideshow,
            placeholder,
            interval: config.interval(),
            shown: None,
            status,
        };
        let task = viewer.refresh();

        (viewer, task)
    }

    /// Handle application messages and update state
    fn update(&mut self, message: Message) -> Task<Message> {
        let task = match message {
            Message::Previous => {
                self.slideshow.previous();
                self.refresh()
            }
            Message::Next | Message::Tick => {
                self.slideshow.next();
                self.refresh()
            }
            Message::OpenFolder => {
                // Show the native folder picker dialog
                let folder = FileDialog::new()
                    .set_title("Select Folder with Images")
                    .pick_folder();

                match folder {
                    Some(folder) => {
                        self.status = format!("Importing from {}...", folder.display());
                        Task::perform(
                            import_folder(folder, self.placeholder.clone()),
                            Message::FolderImported,
                        )
                    }
                    None => Task::none(),
                }
            }
            Message::FolderImported(sources) => {
                self.status = format!("Added {} images.", sources.len());
                self.slideshow.extend(
                    sources
                        .into_iter()
                        .map(|source| Arc::new(source) as Arc<dyn ImageSource>),
                );
                self.refresh()
            }
            Message::PageLoaded(ticket, shown) => {
                if self.slideshow.finish_load(ticket, shown) && !shown {
                    warn!(page = ticket.page, "page failed to load");
                }
                Task::none()
            }
        };

        self.sync_shown();
        task
    }

    /// Start loads for the pages around the current one
    ///
    /// Completions come back on the loader's runtime; each one is turned
    /// into a `PageLoaded` message so the UI thread records the outcome.
    fn refresh(&mut self) -> Task<Message> {
        let mut pending = Vec::new();
        let placeholder = &self.placeholder;

        self.slideshow.refresh_loads(|ticket| {
            let (tx, rx) = oneshot::channel();
            pending.push((ticket, rx));
            let placeholder = placeholder.clone();
            let callback: Callback = Box::new(move |image| {
                let _ = tx.send(shows_loaded_image(image.as_ref(), placeholder.as_ref()));
            });
            callback
        });

        self.sync_shown();

        Task::batch(pending.into_iter().map(|(ticket, rx)| {
            Task::perform(rx, move |shown| {
                Message::PageLoaded(ticket, shown.unwrap_or(false))
            })
        }))
    }

    /// Keep the rendered handle in step with the current page's image
    fn sync_shown(&mut self) {
        let current = self.slideshow.current_image();

        let unchanged = match (&self.shown, &current) {
            (Some((shown, _)), Some(current)) => shown.ptr_eq(current),
            (None, None) => true,
            _ => false,
        };

        if !unchanged {
            self.shown = current.map(|image| {
                let handle = image.to_handle();
                (image, handle)
            });
        }
    }

    /// Build the user interface
    fn view(&self) -> Element<Message> {
        let current = self.slideshow.current();
        let loading = self.slideshow.page_state(current) == Some(PageState::Loading);

        let controls = row![
            button("Previous")
                .on_press(Message::Previous)
                .padding(10),
            text(ui::page_indicator(current, self.slideshow.len()))
                .size(16),
            button("Next")
                .on_press(Message::Next)
                .padding(10),
            button("Open Folder")
                .on_press(Message::OpenFolder)
                .padding(10),
        ]
        .spacing(20)
        .align_y(Alignment::Center);

        let content: Column<Message> = column![
            ui::image_panel(self.shown.as_ref().map(|(_, handle)| handle), loading),
            controls,
            text(&self.status)
                .size(14),
        ]
        .spacing(20)
        .padding(20)
        .align_x(Alignment::Center);

        container(content)
            .width(Length::Fill)
            .height(Length::Fill)
            .into()
    }

    /// Auto-advance while an interval is configured
    fn subscription(&self) -> Subscription<Message> {
        match self.interval {
            Some(interval) if self.slideshow.len() > 1 => {
                iced::time::every(interval).map(|_| Message::Tick)
            }
            _ => Subscription::none(),
        }
    }

    /// Set the application theme
    fn theme(&self) -> Theme {
        Theme::Dark
    }
}

/// Whether a load callback delivered a real image rather than the fallback
///
/// Sources hand back clones of the shared placeholder, so a fallback shares
/// its pixel buffer.
fn shows_loaded_image(image: Option<&Image>, placeholder: Option<&Image>) -> bool {
    match (image, placeholder) {
        (Some(image), Some(placeholder)) => !image.ptr_eq(placeholder),
        (Some(_), None) => true,
        (None, _) => false,
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .init();

    let config = Config::load()?;

    // Loads run on their own runtime so they never block the UI thread
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("image-loader")
        .build()?;

    let transport = DefaultTransport::new(HttpTransport::with_timeout(config.request_timeout())?);
    let loader = ImageLoader::new(Arc::new(transport), runtime.handle().clone());

    iced::application("Image Slideshow", Viewer::update, Viewer::view)
        .subscription(Viewer::subscription)
        .theme(Viewer::theme)
        .centered()
        .run_with(move || Viewer::new(config, loader))?;

    Ok(())
}
