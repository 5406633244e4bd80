mod state;
mod views;
mod widgets;

use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use crossterm::event::{ self, Event, KeyCode, KeyEvent, KeyEventKind };
use ratatui::DefaultTerminal;
use simplelog::{ Config, LevelFilter, WriteLogger };
use webos_media::{
  ActivePlayer, DeliveryConfig, HttpDeliveryResolver, InMemoryMediaService, LunaSendTransport,
  PlayerBuilder, PlayerConfig, PlayerController, Transport,
};

use state::reducers::AppAction;
use state::store::Store;
use views::player::{ LoadTarget, PlayerView };
use views::View;

const FRAME: Duration = Duration::from_millis(100);

#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum TransportKind {
  /// Simulated media service inside this process
  Memory,
  /// The platform media service through luna-send
  Luna,
}

/// Terminal remote for the webOS media service
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
  #[arg(long, value_enum, default_value_t = TransportKind::Memory)]
  transport: TransportKind,

  /// Stream loaded with `l` when no video id is given
  #[arg(long, default_value = "http://localhost/stream.m3u8")]
  url: String,

  #[arg(long, default_value = "application/x-mpegurl")]
  mime: String,

  #[arg(long)]
  live: bool,

  /// Content id resolved through the delivery API instead of `--url`
  #[arg(long)]
  video_id: Option<String>,

  #[arg(long, value_name = "URL")]
  api_base: Option<String>,

  /// Bus address of the media service
  #[arg(long, default_value = webos_media::transport::MEDIA_SERVICE_URI)]
  service_uri: String,

  #[arg(long, default_value_t = 750)]
  poll_ms: u64,

  #[arg(long, default_value = "media-cli.log")]
  log_file: PathBuf,
}

fn main() -> io::Result<()> {
  let args = Args::parse();
  let _ = WriteLogger::init(LevelFilter::Debug, Config::default(), File::create(&args.log_file)?);

  let runtime = tokio::runtime::Builder::new_multi_thread()
    .worker_threads(2)
    .enable_all()
    .build()?;
  let player = runtime.block_on(async { start_player(&args) })?;
  let controller = build_controller(&args, &player)?;

  let store = Arc::new(Store::new());
  let view = PlayerView::new(store.clone(), controller, load_target(&args), runtime.handle().clone());
  let mut app = App { store, view, player, exit: false };

  let mut terminal = ratatui::init();
  let app_result = app.run(&mut terminal);
  ratatui::restore();

  if let Err(e) = runtime.block_on(app.player.shutdown()) {
    log::error!("Shutdown failed: {}", e);
  }
  app_result
}

fn start_player(args: &Args) -> io::Result<ActivePlayer> {
  let config = PlayerConfig::default()
    .with_service_uri(args.service_uri.clone())
    .and_then(|config| config.with_poll_interval(Duration::from_millis(args.poll_ms)))
    .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;

  let transport: Arc<dyn Transport> = match args.transport {
    TransportKind::Memory => Arc::new(InMemoryMediaService::new()),
    TransportKind::Luna => Arc::new(LunaSendTransport::new()),
  };
  log::info!("Starting player with {:?} transport", args.transport);

  PlayerBuilder::from_shared(transport)
    .with_config(config)
    .start()
    .map_err(io::Error::other)
}

fn build_controller(args: &Args, player: &ActivePlayer) -> io::Result<PlayerController> {
  let mut controller = PlayerController::new(player.handle());
  if args.video_id.is_some() {
    let mut config = DeliveryConfig::default();
    if let Some(base_url) = &args.api_base {
      config.base_url = base_url.clone();
    }
    let resolver = HttpDeliveryResolver::new(config).map_err(io::Error::other)?;
    controller.set_resolver(Arc::new(resolver));
  }
  Ok(controller)
}

fn load_target(args: &Args) -> LoadTarget {
  match &args.video_id {
    Some(video_id) => LoadTarget::Video(video_id.clone()),
    None => LoadTarget::Url {
      url: args.url.clone(),
      mime_type: args.mime.clone(),
      is_live: args.live,
    },
  }
}

struct App {
  store: Arc<Store>,
  view: PlayerView,
  player: ActivePlayer,
  exit: bool,
}

impl App {
  fn run(&mut self, terminal: &mut DefaultTerminal) -> io::Result<()> {
    while !self.exit {
      self.pump_player_events();
      terminal.draw(|frame| self.view.render(frame))?;
      self.handle_events()?;
    }
    Ok(())
  }

  fn pump_player_events(&mut self) {
    while let Some(event) = self.player.try_next_event() {
      self.store.dispatch(AppAction::Player(event));
    }
  }

  fn handle_events(&mut self) -> io::Result<()> {
    if !event::poll(FRAME)? {
      return Ok(());
    }
    if let Event::Key(key_event) = event::read()? {
      if key_event.kind != KeyEventKind::Press || self.handle_shared_event(key_event) {
        return Ok(());
      }
      if let Err(e) = self.view.handle_input(key_event, &self.store) {
        log::error!("Command failed: {}", e);
        self.store.dispatch(AppAction::SetStatusMessage(e.to_string()));
      }
    }
    Ok(())
  }

  fn handle_shared_event(&mut self, key_event: KeyEvent) -> bool {
    match key_event.code {
      KeyCode::Char('q') => {
        self.exit = true;
        true
      }
      _ => false,
    }
  }
}
