use std::path::PathBuf;

use anyhow::bail;
use clap::{Args, Parser, Subcommand};
use mu_array::Array;
use mu_gfx::raw::{Allocator, Extent2D};
use mu_gfx::{
    HeadlessBackend, OwnedDevice, OwnedImageView, OwnedInstance, OwnedPipelineLayout,
    OwnedRenderPass, OwnedSurface, OwnedSwapchain, RenderPassInfo, SelectedDevice, SetupConfig,
    SwapchainPlan, check_layers, create_device, create_image_views, create_instance,
    create_pipeline_layout, create_render_pass, create_surface, create_swapchain,
    select_physical_device, swapchain_images,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "mu-cli", about = "CLI tool for mu device and swapchain setup")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print crate info
    Info,
    /// Write the default setup config as JSON
    Config {
        /// Output path
        #[arg(short, long, default_value = "mu.json")]
        output: PathBuf,
    },
    /// Select a device and plan a swapchain on the headless backend
    Select {
        #[command(flatten)]
        setup: SetupArgs,
        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Bring up every resource on the headless backend, then tear it down
    Teardown {
        #[command(flatten)]
        setup: SetupArgs,
    },
}

#[derive(Args)]
struct SetupArgs {
    /// JSON setup config; defaults are used when absent
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Framebuffer width override
    #[arg(long)]
    width: Option<u32>,
    /// Framebuffer height override
    #[arg(long)]
    height: Option<u32>,
    /// Skip validation layers
    #[arg(long)]
    no_validation: bool,
}

impl SetupArgs {
    fn load(&self) -> anyhow::Result<SetupConfig> {
        let mut config = match &self.config {
            Some(path) => SetupConfig::load(path)?,
            None => SetupConfig::default(),
        };
        if let Some(width) = self.width {
            config.framebuffer.width = width;
        }
        if let Some(height) = self.height {
            config.framebuffer.height = height;
        }
        if self.no_validation {
            config.validation = false;
        }
        if config.framebuffer.width == 0 || config.framebuffer.height == 0 {
            bail!("framebuffer must be non-empty, got {}", config.framebuffer);
        }
        Ok(config)
    }
}

/// Every resource from instance to the render pass.
///
/// Fields drop in declaration order, so children are listed before parents.
struct Session<'b> {
    render_pass: OwnedRenderPass<'b>,
    layout: OwnedPipelineLayout<'b>,
    views: Array<OwnedImageView<'b>>,
    swapchain: OwnedSwapchain<'b>,
    device: OwnedDevice<'b>,
    surface: OwnedSurface<'b>,
    instance: OwnedInstance<'b>,
    selected: SelectedDevice,
    plan: SwapchainPlan,
}

impl<'b> Session<'b> {
    fn open(backend: &'b HeadlessBackend, config: &SetupConfig) -> anyhow::Result<Self> {
        if config.validation {
            check_layers(backend, &config.validation_layers)?;
        }
        let allocator = Allocator::DEFAULT;
        let instance = create_instance(backend, &config.instance_info(), allocator)?;
        let surface = create_surface(backend, *instance, allocator)?;
        let selected =
            select_physical_device(backend, *instance, *surface, &config.device_extensions)?;
        let plan = SwapchainPlan::new(
            &selected.support,
            &selected.queue_families,
            config.framebuffer,
        )?;

        let device_info = selected
            .queue_families
            .device_info(&config.device_extensions);
        let device = create_device(backend, selected.physical, &device_info, allocator)?;
        let swapchain = create_swapchain(backend, *device, &plan.info(*surface), allocator)?;
        let images = swapchain_images(backend, *device, *swapchain)?;
        let views = create_image_views(
            backend,
            *device,
            &images,
            plan.surface_format.format,
            allocator,
        )?;
        let render_pass = create_render_pass(
            backend,
            *device,
            &RenderPassInfo {
                color_format: plan.surface_format.format,
            },
            allocator,
        )?;
        let layout = create_pipeline_layout(backend, *device, allocator)?;

        Ok(Self {
            render_pass,
            layout,
            views,
            swapchain,
            device,
            surface,
            instance,
            selected,
            plan,
        })
    }
}

fn print_selection(selected: &SelectedDevice, plan: &SwapchainPlan, extent: Extent2D) {
    println!(
        "Device: {} ({:?})",
        selected.properties.name, selected.properties.device_type
    );
    println!(
        "Queue families: graphics={}, present={}, sharing={:?}",
        selected.queue_families.graphics, selected.queue_families.present, plan.sharing_mode
    );
    println!(
        "Surface format: {} / {}",
        plan.surface_format.format, plan.surface_format.color_space
    );
    println!("Present mode: {}", plan.present_mode);
    println!("Extent: {} (framebuffer {extent})", plan.extent);
    println!("Images: {}", plan.image_count);
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match cli.command {
        Commands::Info => {
            println!("mu-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("ranges: {}", mu_ranges::crate_info());
            println!("array: {}", mu_array::crate_info());
            println!("handle: {}", mu_handle::crate_info());
            println!("gfx: {}", mu_gfx::crate_info());
        }
        Commands::Config { output } => {
            SetupConfig::default().save(&output)?;
            println!("Wrote {}", output.display());
        }
        Commands::Select { setup, json } => {
            let config = setup.load()?;
            let backend = HeadlessBackend::new(config.headless.clone());
            if config.validation {
                check_layers(&backend, &config.validation_layers)?;
            }

            let instance = create_instance(&backend, &config.instance_info(), Allocator::DEFAULT)?;
            let surface = create_surface(&backend, *instance, Allocator::DEFAULT)?;
            let selected =
                select_physical_device(&backend, *instance, *surface, &config.device_extensions)?;
            let plan = SwapchainPlan::new(
                &selected.support,
                &selected.queue_families,
                config.framebuffer,
            )?;

            if json {
                let report = serde_json::json!({
                    "device": selected.properties,
                    "graphics_family": selected.queue_families.graphics,
                    "present_family": selected.queue_families.present,
                    "queue_families": plan.queue_families,
                    "surface_format": plan.surface_format,
                    "present_mode": plan.present_mode,
                    "extent": plan.extent,
                    "image_count": plan.image_count,
                });
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_selection(&selected, &plan, config.framebuffer);
            }
        }
        Commands::Teardown { setup } => {
            let config = setup.load()?;
            let backend = HeadlessBackend::new(config.headless.clone());

            let session = Session::open(&backend, &config)?;
            print_selection(&session.selected, &session.plan, config.framebuffer);
            println!(
                "Live: instance={:?}, surface={:?}, device={:?}, swapchain={:?}, views={}",
                session.instance.raw(),
                session.surface.raw(),
                session.device.raw(),
                session.swapchain.raw(),
                session.views.num()
            );
            println!(
                "      render pass={:?}, pipeline layout={:?}",
                session.render_pass.raw(),
                session.layout.raw()
            );
            tracing::info!(live = backend.live_count(), "tearing down");
            drop(session);

            println!("Destroyed, in order:");
            for (step, record) in backend.destroyed().iter().enumerate() {
                println!("  {:>2}. {} {}", step + 1, record.kind, record.id);
            }

            let violations = backend.violations();
            if !violations.is_empty() {
                for violation in &violations {
                    tracing::error!("{violation}");
                }
                bail!("{} teardown order violations", violations.num());
            }
            if backend.live_count() != 0 {
                bail!("{} resources still live after teardown", backend.live_count());
            }
            println!("Teardown: OK");
        }
    }

    Ok(())
}
