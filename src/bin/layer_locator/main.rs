use anyhow::Context as _;
use clap::Parser as CliParser;
use layer_locator::{
  app::{LocatorApp, build_locators},
  config::{Config, LocatorConfig},
  map::view::MapView,
};

#[derive(clap::Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
  /// Feature layer to list, e.g. https://host/arcgis/rest/services/X/FeatureServer/0 or
  /// file://features.geojson. Added to the layers of the config file.
  #[arg(short, long, requires_all = ["label", "id_field", "label_field"])]
  url: Option<String>,

  /// Label of the layer given with --url.
  #[arg(short, long)]
  label: Option<String>,

  /// Attribute identifying a feature.
  #[arg(short, long)]
  id_field: Option<String>,

  /// Attribute shown for each feature.
  #[arg(short = 'n', long)]
  label_field: Option<String>,

  /// Seconds before a query is given up.
  #[arg(short, long)]
  timeout: Option<u64>,

  /// Config file to read instead of the default one.
  #[arg(short, long)]
  config: Option<std::path::PathBuf>,
}

impl Args {
  fn into_config(self) -> anyhow::Result<Config> {
    let base = match &self.config {
      Some(path) => Config::load(path)?,
      None => Config::new(),
    };
    let locators = match (self.url, self.label, self.id_field, self.label_field) {
      (Some(query_url), Some(label), Some(id_field), Some(label_field)) => vec![LocatorConfig {
        query_url,
        label,
        id_field,
        label_field,
      }],
      _ => Vec::new(),
    };
    let from_args = Config {
      config_path: None,
      locators,
      query_timeout_secs: self.timeout,
    };
    Ok(from_args.merge(&base))
  }
}

fn main() -> anyhow::Result<()> {
  let args = Args::parse();

  // init logger.
  env_logger::init();

  let config = args.into_config()?;
  if config.locators.is_empty() {
    log::warn!("No layers configured, pass --url or add locators to the config file");
  }

  // Tokio runtime, kept alive on a background thread for the queries.
  let rt = tokio::runtime::Runtime::new().context("failed to start tokio runtime")?;
  let handle = rt.handle().clone();
  let _enter = handle.enter();
  std::thread::spawn(move || {
    rt.block_on(async {
      loop {
        tokio::time::sleep(tokio::time::Duration::from_secs(3600)).await;
      }
    });
  });

  let options = eframe::NativeOptions {
    viewport: egui::ViewportBuilder {
      inner_size: Some(egui::vec2(1200.0, 800.0)),
      clamp_size_to_monitor_size: Some(true),
      ..Default::default()
    },
    ..Default::default()
  };

  eframe::run_native(
    "layer-locator",
    options,
    Box::new(move |cc| {
      let (map, sender) = MapView::new();
      let locators = build_locators(&config, &sender, &cc.egui_ctx);
      Ok(Box::new(LocatorApp::new(map, locators)))
    }),
  )
  .map_err(|e| anyhow::anyhow!("failed to run the ui: {e}"))
}
