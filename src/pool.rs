//! The tile worker pool: N workers, each with a private job queue and its
//! own back-end instance, funneling writeouts to a single main-thread
//! queue.
//!
//! Grounded on the reference's thread pool: fixed worker count chosen at
//! construction, tiles routed by `tileId % N`, and a drain sequence of
//! pump-main / wait-for-workers / pump-main-again so writeouts enqueued by
//! the very last tile are never left stranded. Workers only ever *read*
//! VRAM; the main thread is the sole writer, so jobs carry a cheaply
//! cloned `Arc<Vram>` rather than needing any lock around tile reads.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread::JoinHandle;

use parking_lot::{Condvar, Mutex};

use crate::error::PoolError;
use crate::raster::{render_tile, BackendFactory, RasterBackend, WriteoutTask};
use crate::region::RegionEntry;
use crate::registers::PvrRegisters;
use crate::vram::Vram;

struct TileJob {
    vram: Arc<Vram>,
    regs: PvrRegisters,
    entry: RegionEntry,
}

/// Counts tile jobs submitted but not yet finished, so draining can wait
/// until every worker queue is both empty and its in-flight task done.
#[derive(Default)]
struct Pending {
    count: AtomicUsize,
    cond: Condvar,
    lock: Mutex<()>,
}

impl Pending {
    fn inc(&self) {
        self.count.fetch_add(1, Ordering::SeqCst);
    }

    fn dec_and_notify(&self) {
        if self.count.fetch_sub(1, Ordering::SeqCst) == 1 {
            let _guard = self.lock.lock();
            self.cond.notify_all();
        }
    }

    fn wait_until_zero(&self) {
        let mut guard = self.lock.lock();
        while self.count.load(Ordering::SeqCst) != 0 {
            self.cond.wait(&mut guard);
        }
    }
}

enum Mode<B: RasterBackend> {
    /// `worker_count == 0`: run every tile inline on the caller's thread.
    Synchronous(B),
    /// `worker_count > 0`: dispatch across a fixed pool of worker threads.
    Parallel {
        senders: Vec<Sender<TileJob>>,
        writeout_rx: Receiver<WriteoutTask>,
        pending: Arc<Pending>,
        handles: Vec<JoinHandle<()>>,
        running: Arc<Mutex<bool>>,
    },
}

/// A fixed-size tile worker pool.
///
/// Construct once per renderer with [`TilePool::new`]; call
/// [`TilePool::render_frame`] once per `START_RENDER` to walk a set of
/// region entries and collect every writeout task the frame produced.
pub struct TilePool<B: RasterBackend> {
    mode: Mode<B>,
    stopped: bool,
}

impl<B: RasterBackend + Send + 'static> TilePool<B> {
    /// Build a pool with `worker_count` workers, each constructed via
    /// `factory`. `worker_count == 0` runs synchronously on the caller's
    /// thread instead of starting any threads.
    pub fn new<F>(factory: F, worker_count: usize) -> Self
    where
        F: BackendFactory<Backend = B> + 'static,
    {
        if worker_count == 0 {
            let mut backend = factory.create();
            backend.init(crate::raster::TILE_SIZE, crate::raster::TILE_SIZE);
            return TilePool { mode: Mode::Synchronous(backend), stopped: false };
        }

        let factory = Arc::new(factory);
        let pending = Arc::new(Pending::default());
        let running = Arc::new(Mutex::new(true));
        let (writeout_tx, writeout_rx) = mpsc::channel();

        let mut senders = Vec::with_capacity(worker_count);
        let mut handles = Vec::with_capacity(worker_count);

        for _ in 0..worker_count {
            let (tx, rx) = mpsc::channel::<TileJob>();
            let factory = Arc::clone(&factory);
            let pending = Arc::clone(&pending);
            let running = Arc::clone(&running);
            let writeout_tx = writeout_tx.clone();

            let handle = std::thread::spawn(move || {
                let mut backend = factory.create();
                backend.init(crate::raster::TILE_SIZE, crate::raster::TILE_SIZE);
                while *running.lock() {
                    match rx.recv() {
                        Ok(job) => {
                            if let Some(task) = render_tile(&job.vram, &job.regs, job.entry, &mut backend) {
                                // The receiving end only ever goes away when the
                                // pool itself is being torn down, at which point
                                // a dropped writeout is harmless.
                                let _ = writeout_tx.send(task);
                            }
                            pending.dec_and_notify();
                        }
                        Err(_) => break,
                    }
                }
            });

            senders.push(tx);
            handles.push(handle);
        }

        TilePool {
            mode: Mode::Parallel { senders, writeout_rx, pending, handles, running },
            stopped: false,
        }
    }

    /// Render every region entry, routing tiles by `tileId % worker_count`,
    /// and return every writeout task the frame produced, drained with the
    /// pump/wait/pump sequence so none are left stranded.
    ///
    /// Returns [`PoolError::PoolStopped`] if called after [`TilePool::stop`],
    /// and [`PoolError::PoolNotRunning`] if a worker's job queue has gone
    /// away without the pool having been stopped through the normal path
    /// (a worker thread panicked mid-task) — both are pool-misuse or
    /// pool-failure conditions per the error handling design (§7), not
    /// something a caller can usefully retry.
    pub fn render_frame(
        &mut self,
        vram: Arc<Vram>,
        regs: &PvrRegisters,
        entries: impl IntoIterator<Item = RegionEntry>,
    ) -> Result<Vec<WriteoutTask>, PoolError> {
        if self.stopped {
            return Err(PoolError::PoolStopped);
        }

        match &mut self.mode {
            Mode::Synchronous(backend) => Ok(entries
                .into_iter()
                .filter_map(|entry| render_tile(&vram, regs, entry, backend))
                .collect()),
            Mode::Parallel { senders, writeout_rx, pending, .. } => {
                for entry in entries {
                    let worker = (entry.tile_id() as usize) % senders.len();
                    pending.inc();
                    if senders[worker].send(TileJob { vram: Arc::clone(&vram), regs: *regs, entry }).is_err() {
                        return Err(PoolError::PoolNotRunning);
                    }
                }

                let mut writeouts: Vec<WriteoutTask> = writeout_rx.try_iter().collect();
                pending.wait_until_zero();
                writeouts.extend(writeout_rx.try_iter());
                Ok(writeouts)
            }
        }
    }

    /// Signal every worker to stop after its current task and join them.
    ///
    /// A no-op for a synchronous (`worker_count == 0`) pool beyond marking
    /// it stopped. Idempotent: calling this more than once only joins once.
    /// After this returns, [`TilePool::render_frame`] returns
    /// [`PoolError::PoolStopped`] instead of doing any work.
    pub fn stop(&mut self) {
        if self.stopped {
            return;
        }
        self.stopped = true;
        if let Mode::Parallel { senders, running, handles, .. } = &mut self.mode {
            *running.lock() = false;
            // Dropping the senders unblocks any worker parked in `recv`.
            drop(std::mem::take(senders));
            for handle in std::mem::take(handles) {
                let _ = handle.join();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::mock::MockBackend;

    fn empty_entry(tile_x: u32, tile_y: u32) -> RegionEntry {
        RegionEntry {
            tile_x,
            tile_y,
            z_keep: true,
            no_writeout: false,
            last_region: false,
            opaque: crate::region::ListPointer::from_raw(0x8000_0000),
            opaque_mod: crate::region::ListPointer::from_raw(0x8000_0000),
            trans: crate::region::ListPointer::from_raw(0x8000_0000),
            trans_mod: crate::region::ListPointer::from_raw(0x8000_0000),
            puncht: crate::region::ListPointer::from_raw(0x8000_0000),
        }
    }

    #[test]
    fn synchronous_pool_renders_every_tile_and_drains_cleanly() {
        let vram = Arc::new(Vram::new(4096));
        let regs = PvrRegisters::default();
        let mut pool = TilePool::new(MockBackend::new, 0);

        let entries = vec![empty_entry(0, 0), empty_entry(1, 0), empty_entry(2, 0)];
        let writeouts = pool.render_frame(Arc::clone(&vram), &regs, entries).unwrap();
        assert_eq!(writeouts.len(), 3);
    }

    #[test]
    fn parallel_pool_renders_every_tile_and_drains_cleanly() {
        let vram = Arc::new(Vram::new(4096));
        let regs = PvrRegisters::default();
        let mut pool = TilePool::new(MockBackend::new, 4);

        let entries: Vec<_> = (0..16).map(|i| empty_entry(i, 0)).collect();
        let writeouts = pool.render_frame(Arc::clone(&vram), &regs, entries).unwrap();
        assert_eq!(writeouts.len(), 16);

        pool.stop();
    }

    #[test]
    fn render_frame_after_stop_returns_pool_stopped() {
        let vram = Arc::new(Vram::new(4096));
        let regs = PvrRegisters::default();
        let mut pool = TilePool::new(MockBackend::new, 2);
        pool.stop();

        let err = pool.render_frame(Arc::clone(&vram), &regs, vec![empty_entry(0, 0)]).unwrap_err();
        assert_eq!(err, PoolError::PoolStopped);
    }
}
