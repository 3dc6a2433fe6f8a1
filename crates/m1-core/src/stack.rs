//! Orchestrator (C8): owns all mutable stack state behind a single
//! coarse lock and exposes `submit`/`tick`/registration.

use core::cell::RefCell;

use critical_section::Mutex;
use heapless::Vec;
use m1_frame::{Attributes, Frame, Header, Reliability};

use crate::dispatch::{Dispatch, Handler, RxView};
use crate::framer::{Framer, FramerStats};
use crate::limits::{
    MAX_DATA_TYPES, MAX_DEDUPE_SOURCES, MAX_FRAME_LEN, MAX_LINKS, MAX_LOCAL_IDS,
    MAX_PAYLOAD_LEN, MAX_PENDING_FRAMES, MAX_ROUTES, MAX_TRACKING, POOL_SLOTS, SCRATCH_LEN,
};
use crate::link::{LinkRx, LinkTx};
use crate::private::*;
use crate::reliable::{ReliableEngine, TrackingRecord, DEFAULT_ACK_WAIT_MS, DEFAULT_MAX_RETRY};
use crate::router::{self, Inbound, Route};
use crate::sender;

/// Static routing configuration for one route.
#[derive(Debug, Clone, Copy)]
pub struct RouteConfig {
    pub target_id: u8,
    pub link_id: usize,
    pub max_pkg_size: usize,
    pub read_freq: u32,
}

/// Typed replacement for `m1_protocol_init`'s positional parameters.
pub struct StackConfig<'a> {
    pub name: &'a str,
    /// This node's own identity, stamped as `source_id` on every
    /// outbound frame.
    pub self_id: u8,
    /// Every identifier this node accepts as "local" on the inbound
    /// path (may be a superset of `self_id`, e.g. broadcast groups).
    pub local_ids: &'a [u8],
    pub routes: &'a [RouteConfig],
    /// Enables per-source last-`seq_num` de-duplication of inbound
    /// reliable dispatch (§9 Open Question; default preserves the
    /// original's at-least-once-but-possibly-twice behavior).
    pub dedupe_inbound: bool,
    /// Invoked once, from the tick thread, when a reliable packet's
    /// retry budget is exhausted.
    pub tx_abnormal: Option<fn(source_id: u8, target_id: u8, seq_num: u8)>,
}

/// Per-send overrides for attributes and reliability (§3.2).
#[derive(Debug, Clone, Copy)]
pub struct TxOptions {
    pub version: u8,
    pub data_type: u8,
    pub fragment: bool,
    pub encrypt: u8,
    pub priority: u8,
    pub compress: u8,
    pub reliable: bool,
    pub retry_budget: u8,
    pub wait_deadline_ms: i32,
}

impl Default for TxOptions {
    fn default() -> Self {
        Self {
            version: 0,
            data_type: 0,
            fragment: false,
            encrypt: 0,
            priority: 0,
            compress: 0,
            reliable: false,
            retry_budget: DEFAULT_MAX_RETRY,
            wait_deadline_ms: DEFAULT_ACK_WAIT_MS,
        }
    }
}

type Reliable = ReliableEngine<POOL_SLOTS, MAX_PAYLOAD_LEN, MAX_TRACKING>;
type FrameBuf = Vec<u8, MAX_FRAME_LEN>;

struct StackInner<L> {
    self_id: u8,
    source_ids: Vec<u8, MAX_LOCAL_IDS>,
    routes: Vec<Route, MAX_ROUTES>,
    links: Vec<L, MAX_LINKS>,
    seq_next: Vec<u8, MAX_ROUTES>,
    parsers: Vec<Framer<MAX_FRAME_LEN>, MAX_LINKS>,
    dispatch: Dispatch<MAX_DATA_TYPES>,
    reliable: Reliable,
    dedupe_inbound: bool,
    last_seen: Vec<(u8, u8), MAX_DEDUPE_SOURCES>,
    tx_abnormal: Option<fn(u8, u8, u8)>,
}

impl<L: LinkTx + LinkRx> StackInner<L> {
    fn find_route(&self, target_id: u8) -> Result<usize> {
        router::route_outbound(&self.routes, target_id)
    }

    /// Stamps and transmits, optionally advancing `seq_next[route]`.
    fn send_stamped(
        &mut self,
        route_idx: usize,
        header: Header,
        payload: &[u8],
        auto_stamp: bool,
    ) -> Result<u8> {
        let seq = if auto_stamp {
            let seq = self.seq_next[route_idx];
            self.seq_next[route_idx] = seq.wrapping_add(1);
            seq
        } else {
            header.seq_num
        };

        let mut header = header;
        header.seq_num = seq;

        let link_id = self.routes[route_idx].link_id;
        sender::send_frame(&mut self.links[link_id], header, payload)?;
        Ok(seq)
    }

    fn was_seen(&mut self, source_id: u8, seq_num: u8) -> bool {
        if let Some(slot) = self.last_seen.iter_mut().find(|(id, _)| *id == source_id) {
            let dup = slot.1 == seq_num;
            slot.1 = seq_num;
            dup
        } else {
            let _ = self.last_seen.push((source_id, seq_num));
            false
        }
    }

    fn handle_local_frame(&mut self, decoded: Frame<'_>) -> Result<()> {
        let header = decoded.header;
        let payload = decoded.payload;

        match header.attrs.reliable {
            Reliability::Ack => {
                self.reliable
                    .on_ack(header.ack_num, header.source_id, header.target_id);
                Ok(())
            }
            Reliability::Request => {
                let ack_header = Header {
                    version: header.version,
                    data_type: header.data_type,
                    source_id: header.target_id,
                    target_id: header.source_id,
                    attrs: Attributes {
                        reliable: Reliability::Ack,
                        ..Default::default()
                    },
                    data_len: 0,
                    seq_num: 0,
                    ack_num: header.seq_num,
                };
                if let Ok(route_idx) = self.find_route(header.source_id) {
                    let _ = self.send_stamped(route_idx, ack_header, &[], false);
                }

                let duplicate = self.dedupe_inbound && self.was_seen(header.source_id, header.seq_num);
                if duplicate {
                    return Ok(());
                }
                self.dispatch.dispatch(
                    header.data_type,
                    RxView {
                        source_id: header.source_id,
                        target_id: header.target_id,
                        payload,
                    },
                )
            }
            Reliability::None => self.dispatch.dispatch(
                header.data_type,
                RxView {
                    source_id: header.source_id,
                    target_id: header.target_id,
                    payload,
                },
            ),
        }
    }

    fn handle_frame_bytes(&mut self, arrival_link_id: usize, bytes: &[u8]) {
        let Ok(decoded) = Frame::decode(bytes) else {
            return;
        };

        match router::route_inbound(&self.source_ids, &self.routes, decoded.header.target_id) {
            Ok(Inbound::Local) => {
                let _ = self.handle_local_frame(decoded);
            }
            Ok(Inbound::Forward { link_id }) => {
                let _ = self.links[link_id].tx(bytes);
            }
            Err(_) => {
                let _ = arrival_link_id;
            }
        }
    }
}

/// Owns the stack's mutable state behind a single coarse lock (§5),
/// matching the pack's embedded convention of guarding shared state
/// reachable from both a tick thread and caller threads.
pub struct Stack<L: LinkTx + LinkRx> {
    inner: Mutex<RefCell<StackInner<L>>>,
}

impl<L: LinkTx + LinkRx> Stack<L> {
    /// Initializes the stack. `links` must have one entry per distinct
    /// physical link referenced by `config.routes`, indexed by
    /// `RouteConfig::link_id`.
    ///
    /// # Errors
    ///
    /// Returns `Inval` if any route's `link_id` is out of range, or
    /// `NoSpace` if `links` or `config.routes` exceeds the compiled
    /// capacity (see `limits`).
    pub fn new(config: StackConfig<'_>, links: impl IntoIterator<Item = L>) -> Result<Self> {
        let mut link_vec: Vec<L, MAX_LINKS> = Vec::new();
        for link in links {
            link_vec.push(link).map_err(|_| Error::NoSpace)?;
        }

        let mut routes: Vec<Route, MAX_ROUTES> = Vec::new();
        for route in config.routes {
            if route.link_id >= link_vec.len() {
                return Err(Error::Inval);
            }
            routes
                .push(Route {
                    target_id: route.target_id,
                    link_id: route.link_id,
                    max_pkg_size: route.max_pkg_size,
                    read_freq: route.read_freq,
                })
                .map_err(|_| Error::NoSpace)?;
        }

        let mut source_ids: Vec<u8, MAX_LOCAL_IDS> = Vec::new();
        for &id in config.local_ids {
            source_ids.push(id).map_err(|_| Error::NoSpace)?;
        }

        let mut seq_next: Vec<u8, MAX_ROUTES> = Vec::new();
        for _ in 0..routes.len() {
            seq_next.push(0).map_err(|_| Error::NoSpace)?;
        }

        // One parser per distinct inbound link, deduplicated by index
        // (stands in for the original's dedup-by-handle-identity).
        let mut parsers: Vec<Framer<MAX_FRAME_LEN>, MAX_LINKS> = Vec::new();
        for link_idx in 0..link_vec.len() {
            let on_link = routes.iter().filter(|r| r.link_id == link_idx);
            let read_freq = on_link.clone().next().map_or(1, |r| r.read_freq);
            // A link may carry several routes; size the parser's drop
            // threshold to the most permissive of them.
            let max_pkg_size = on_link
                .map(|r| r.max_pkg_size)
                .max()
                .unwrap_or(MAX_FRAME_LEN);
            parsers
                .push(Framer::new(read_freq, max_pkg_size))
                .map_err(|_| Error::NoSpace)?;
        }

        let inner = StackInner {
            self_id: config.self_id,
            source_ids,
            routes,
            links: link_vec,
            seq_next,
            parsers,
            dispatch: Dispatch::new(),
            reliable: Reliable::new(),
            dedupe_inbound: config.dedupe_inbound,
            last_seen: Vec::new(),
            tx_abnormal: config.tx_abnormal,
        };

        #[cfg(feature = "log")]
        info!("stack '{}' initialized", config.name);

        Ok(Self {
            inner: Mutex::new(RefCell::new(inner)),
        })
    }

    /// Registers a dispatch handler for `data_type` (§4.7).
    pub fn register(&self, data_type: u8, handler: Handler) -> Result<()> {
        critical_section::with(|cs| {
            self.inner.borrow(cs).borrow_mut().dispatch.register(data_type, handler)
        })
    }

    /// Snapshot of the given link's parser statistics (§4.3, testable
    /// property 4).
    ///
    /// # Errors
    ///
    /// Returns `NotExist` if `link_id` is out of range.
    pub fn link_stats(&self, link_id: usize) -> Result<FramerStats> {
        critical_section::with(|cs| {
            let inner = self.inner.borrow(cs).borrow();
            inner
                .parsers
                .get(link_id)
                .map(|parser| *parser.stats())
                .ok_or(Error::NotExist)
        })
    }

    /// Number of reliable packets currently awaiting an ack
    /// (`wait_ack_list` length, §4.6, scenario S5).
    pub fn pending_reliable_count(&self) -> usize {
        critical_section::with(|cs| self.inner.borrow(cs).borrow().reliable.len())
    }

    /// Submits a packet to a single target. If `opts.reliable`, the
    /// packet is tracked for retry and released on ack.
    pub fn submit(&self, target_id: u8, payload: &[u8], opts: TxOptions) -> Result<()> {
        self.submit_many(&[target_id], payload, opts)
    }

    /// Submits the same payload to every id in `target_ids`. Reliable
    /// sends share one payload slot across all resulting tracking
    /// records (§4.6).
    ///
    /// # Errors
    ///
    /// For a non-reliable send, returns the first `NotExist` (no route
    /// for `target_id`) or `Io` (link refused the frame) encountered.
    /// A reliable send may return `Ok` even if an individual target's
    /// route lookup or transmit failed (§4.6 step 3): the packet is
    /// still tracked and retried on the next tick.
    pub fn submit_many(&self, target_ids: &[u8], payload: &[u8], opts: TxOptions) -> Result<()> {
        critical_section::with(|cs| {
            let mut inner = self.inner.borrow(cs).borrow_mut();
            let self_id = inner.self_id;

            let mut first_record: Option<(usize, usize)> = None; // (route_idx consumed, tracking pos)
            let mut first_error: Option<Error> = None;

            for &target_id in target_ids {
                let route_idx = match inner.find_route(target_id) {
                    Ok(route_idx) => route_idx,
                    Err(err) => {
                        if !opts.reliable {
                            first_error.get_or_insert(err);
                        }
                        continue;
                    }
                };

                let attrs = Attributes {
                    reliable: if opts.reliable {
                        Reliability::Request
                    } else {
                        Reliability::None
                    },
                    fragment: opts.fragment,
                    encrypt: opts.encrypt,
                    priority: opts.priority,
                    compress: opts.compress,
                };

                let header = Header {
                    version: opts.version,
                    data_type: opts.data_type,
                    source_id: self_id,
                    target_id,
                    attrs,
                    data_len: payload.len() as u16,
                    seq_num: 0,
                    ack_num: 0,
                };

                if opts.reliable {
                    let seq = inner.seq_next[route_idx];
                    let tracking_pos = match first_record {
                        None => inner.reliable.track_first(
                            self_id,
                            target_id,
                            seq,
                            opts.version,
                            opts.data_type,
                            attrs,
                            payload,
                            opts.retry_budget,
                            opts.wait_deadline_ms,
                        ),
                        Some((_, pos)) => {
                            let payload_idx = inner.reliable.payload_idx_of(pos);
                            inner.reliable.track_shared(
                                payload_idx,
                                self_id,
                                target_id,
                                seq,
                                opts.version,
                                opts.data_type,
                                attrs,
                                opts.retry_budget,
                                opts.wait_deadline_ms,
                            )
                        }
                    };

                    let Ok(tracking_pos) = tracking_pos else {
                        continue;
                    };
                    if first_record.is_none() {
                        first_record = Some((route_idx, tracking_pos));
                    }

                    let _ = inner.send_stamped(route_idx, header, payload, true);
                } else if let Err(err) = inner.send_stamped(route_idx, header, payload, true) {
                    first_error.get_or_insert(err);
                }
            }

            if opts.reliable {
                Ok(())
            } else {
                first_error.map_or(Ok(()), Err)
            }
        })
    }

    /// Drives C3 (per-parser byte pump) and C6 (retry tick) once.
    ///
    /// `tick_counter` is the caller's running tick count at `freq_hz`;
    /// a parser whose own `read_freq` is `f` runs when
    /// `tick_counter mod (freq_hz / f) == 0`.
    pub fn tick(&self, freq_hz: u32, tick_counter: u32) {
        critical_section::with(|cs| {
            let mut inner = self.inner.borrow(cs).borrow_mut();

            let link_count = inner.links.len();
            for link_id in 0..link_count {
                let divisor = (freq_hz / inner.parsers[link_id].read_freq().max(1)).max(1);
                if tick_counter % divisor != 0 {
                    continue;
                }

                let mut scratch = [0u8; SCRATCH_LEN];
                let n = match inner.links[link_id].rx(&mut scratch) {
                    Ok(n) => n,
                    Err(_) => continue,
                };
                if n == 0 {
                    continue;
                }

                let mut pending: Vec<FrameBuf, MAX_PENDING_FRAMES> = Vec::new();
                {
                    let parser = &mut inner.parsers[link_id];
                    parser.feed(&scratch[..n], |frame| {
                        let mut buf = FrameBuf::new();
                        if buf.extend_from_slice(frame).is_ok() {
                            let _ = pending.push(buf);
                        }
                    });
                }

                for frame in &pending {
                    inner.handle_frame_bytes(link_id, frame);
                }
            }

            let tx_abnormal = inner.tx_abnormal;
            let routes = inner.routes.clone();
            let mut links = core::mem::take(&mut inner.links);

            inner.reliable.tick(
                freq_hz,
                |record, payload| {
                    if let Some(route) = routes.iter().find(|r| r.target_id == record.target_id) {
                        let header = retransmit_header(record);
                        let _ = sender::send_frame(&mut links[route.link_id], header, payload);
                    }
                },
                |record| {
                    #[cfg(feature = "log")]
                    warn!(
                        "reliable packet to {} seq {} exhausted retries",
                        record.target_id, record.seq_num
                    );
                    if let Some(cb) = tx_abnormal {
                        cb(record.source_id, record.target_id, record.seq_num);
                    }
                },
            );

            inner.links = links;
        });
    }
}

fn retransmit_header(record: &TrackingRecord) -> Header {
    Header {
        version: record.version,
        data_type: record.data_type,
        source_id: record.source_id,
        target_id: record.target_id,
        attrs: record.attrs,
        data_len: 0, // overwritten by `Frame::encode` from the actual payload slice
        seq_num: record.seq_num,
        ack_num: 0,
    }
}
