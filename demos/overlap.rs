use clap::{Parser, ValueEnum};
use gridhalo::block::*;
use gridhalo::build_info;
use gridhalo::comm::*;
use gridhalo::field::*;
use gridhalo::init;
use gridhalo::sweep::*;
use gridhalo::timeloop::*;
use gridhalo::util::*;
use gridhalo::Result;
use tracing_subscriber::EnvFilter;

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum Exchange {
    /// Pack infos with serialized buffers.
    Buffered,
    /// Zero copy datatype transfers.
    Datatype,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum KernelChoice {
    Jacobi,
    D3q19,
    D3q27,
}

/// Compare overlapped inner/outer time stepping against a synchronous run.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Blocks along each axis.
    #[arg(short, long, default_value = "2")]
    blocks: usize,

    /// Interior cells per block along each axis.
    #[arg(short, long, default_value = "16")]
    cells: usize,

    /// Components per cell for the jacobi kernel.
    #[arg(short, long, default_value = "1")]
    f_size: usize,

    /// Time steps.
    #[arg(short, long, default_value = "10")]
    steps: usize,

    /// The number of threads to use.
    #[arg(short, long, default_value = "8")]
    threads: usize,

    /// Chunk size to use for parallel initialization.
    #[arg(long, default_value = "1000")]
    chunk_size: usize,

    #[arg(short, long, value_enum, default_value = "buffered")]
    exchange: Exchange,

    #[arg(short, long, value_enum, default_value = "jacobi")]
    kernel: KernelChoice,

    /// Exchange only the components the kernel reads.
    #[arg(long)]
    reduced: bool,

    /// Periodic along all axes.
    #[arg(short, long)]
    periodic: bool,

    /// Run the six boundary layers on dedicated streams.
    #[arg(long)]
    streams: bool,

    /// Use the local block shortcut for buffered exchange.
    #[arg(long)]
    local_shortcut: bool,

    /// Print build information and quit
    #[arg(long)]
    build_info: bool,
}

impl Args {
    fn cli_setup(name: &str) -> Self {
        let args = Args::parse();

        if args.build_info {
            build_info::print_report(name);
            std::process::exit(0);
        }

        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| EnvFilter::new("info")),
            )
            .init();

        rayon::ThreadPoolBuilder::new()
            .num_threads(args.threads)
            .thread_name(|i| format!("rayon_thread_{}", i))
            .build_global()
            .unwrap();

        args
    }

    fn shape(&self, f_size: usize) -> Result<FieldShape> {
        FieldShape::new([self.cells; 3], f_size, 1)
    }

    fn scheme<K: Kernel>(
        &self,
        kernel: &K,
        id: BlockDataId,
        f_size: usize,
    ) -> Result<UniformScheme> {
        let spec = if self.reduced {
            kernel.comm_spec()?
        } else {
            CommSpec::all_components(f_size, &Direction::NEIGHBORS)
        };
        let mut scheme = UniformScheme::all_neighbors()
            .with_local_shortcut(self.local_shortcut);
        let kind = ExchangeKind::Pull;
        match self.exchange {
            Exchange::Buffered => {
                let info =
                    FieldPackInfo::<CellMajor>::new(id, kind, spec, f_size)?;
                scheme.add_pack_info(info)?
            }
            Exchange::Datatype => {
                let info = FieldDatatypeInfo::<CellMajor>::new(
                    id, kind, spec, f_size,
                )?;
                scheme.add_datatype_info(info)?
            }
        }
        Ok(scheme)
    }

    fn forest(&self, shape: FieldShape) -> Result<(BlockForest, SweepFields)> {
        let mut forest =
            BlockForest::new([self.blocks; 3], [self.periodic; 3])?;
        let src = forest.add_field::<CellMajor>("src", shape)?;
        let dst = forest.add_field::<CellMajor>("dst", shape)?;
        for id in [src, dst] {
            init::global::<CellMajor, _>(
                &mut forest,
                id,
                initial_value,
                self.chunk_size,
            )?;
        }
        Ok((forest, SweepFields::double_buffered(src, dst)))
    }
}

fn initial_value(c: Coord<3>, component: usize) -> f64 {
    let h = (c[0] as i64 * 73_856_093)
        ^ (c[1] as i64 * 19_349_663)
        ^ (c[2] as i64 * 83_492_791);
    (h.rem_euclid(1024) as f64) / 1024.0 + component as f64
}

fn max_difference(
    a: &BlockForest,
    b: &BlockForest,
    id: BlockDataId,
) -> Result<f64> {
    let mut result: f64 = 0.0;
    for (x, y) in a.blocks().iter().zip(b.blocks()) {
        let x = x.get_data::<Field<CellMajor>>(id)?;
        let y = y.get_data::<Field<CellMajor>>(id)?;
        for c in x.xyz_size().coord_iter() {
            for i in 0..x.f_size() {
                result = result.max((x.get(&c, i) - y.get(&c, i)).abs());
            }
        }
    }
    Ok(result)
}

fn run<K: Kernel + Clone>(args: &Args, kernel: K, f_size: usize) -> Result<()> {
    let shape = args.shape(f_size)?;

    let (mut overlapped_forest, fields) = args.forest(shape)?;
    let execution = if args.streams {
        OuterExecution::streams()?
    } else {
        OuterExecution::Sequential
    };
    let sweep = InnerOuterSweep::<_, CellMajor>::new(
        kernel.clone(),
        fields,
        shape,
        execution,
    )?;
    let scheme = args.scheme(&kernel, fields.src, f_size)?;
    let mut overlapped = Timeloop::overlapped(scheme, sweep);

    let (mut synchronous_forest, _) = args.forest(shape)?;
    let sweep = Sweep::<_, CellMajor>::new(kernel.clone(), fields)?;
    let scheme = args.scheme(&kernel, fields.src, f_size)?;
    let mut synchronous = Timeloop::synchronous(scheme, sweep);

    let start = std::time::Instant::now();
    overlapped.run(&mut overlapped_forest, args.steps)?;
    let overlapped_s = start.elapsed().as_secs_f64();

    let start = std::time::Instant::now();
    synchronous.run(&mut synchronous_forest, args.steps)?;
    let synchronous_s = start.elapsed().as_secs_f64();

    let difference =
        max_difference(&overlapped_forest, &synchronous_forest, fields.src)?;
    println!("{{");
    println!("  \"blocks\": {},", overlapped_forest.len());
    println!("  \"cells_per_block\": {},", shape.xyz_size().buffer_size());
    println!("  \"steps\": {},", args.steps);
    println!("  \"overlapped_s\": {},", overlapped_s);
    println!("  \"synchronous_s\": {},", synchronous_s);
    println!("  \"max_difference\": {}", difference);
    println!("}}");
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::cli_setup("overlap");

    #[cfg(feature = "profile-with-puffin")]
    let _puffin_server = {
        let server_addr = format!("127.0.0.1:{}", puffin_http::DEFAULT_PORT);
        println!(
            "Run this to view profiling data:  puffin_viewer {server_addr}"
        );
        let server = puffin_http::Server::new(&server_addr).unwrap();
        profiling::puffin::set_scopes_on(true);
        server
    };

    match args.kernel {
        KernelChoice::Jacobi => {
            run(&args, Jacobi7::new(args.f_size), args.f_size)
        }
        KernelChoice::D3q19 => {
            let stream = PullStream::d3q19();
            let q = stream.q();
            run(&args, stream, q)
        }
        KernelChoice::D3q27 => {
            let stream = PullStream::d3q27();
            let q = stream.q();
            run(&args, stream, q)
        }
    }
}
