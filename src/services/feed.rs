//! feed.rs
//!
//! Сборка кадров карты занятости: позиции (кеш -> бэкенд) и статусы/загрузка
//! запрашиваются параллельно и соединяются через `OccupancyView`.
//!
//! Представления живут дольше запроса, по одному на площадку и вид карты.
//! Каждый запрос открывает новое поколение своего представления, поэтому ответ
//! на запрос, начатый раньше (например, на старый диапазон дат), не затирает
//! данные более позднего, даже если бэкенд ответил на него последним.

use chrono::NaiveDate;
use std::collections::HashMap;
use std::fmt::Display;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::time::Instant;
use tracing::debug;

use crate::cache::CacheService;
use crate::gesture::{TouchEvent, TouchResponse, ZoomBounds};
use crate::models::{SeatNumber, SeatPosition};
use crate::occupancy::{Generation, OccupancyView, RenderFrame, SeatStatus, SeatUsage, ZoomState};
use crate::services::upstream::{UpstreamClient, UpstreamError};

/// Сколько представлений держим на каждый вид карты; самые давние вытесняются.
pub const MAX_TRACKED_VIEWS: usize = 1024;

/// Кадр вместе с масштабом карты, которой он принадлежит.
#[derive(Debug, Clone)]
pub struct MapSnapshot<V> {
    pub frame: RenderFrame<V>,
    pub zoom: ZoomState,
}

#[derive(Debug, Clone, Copy)]
pub struct GestureOutcome {
    pub consumed: bool,
    pub zoom: ZoomState,
}

struct TrackedView<V> {
    view: OccupancyView<V>,
    touched: Instant,
}

struct ViewRegistry<V> {
    views: Mutex<HashMap<i64, TrackedView<V>>>,
    cell_size: u32,
    zoom_bounds: ZoomBounds,
}

impl<V: Clone + Default> ViewRegistry<V> {
    fn new(cell_size: u32, zoom_bounds: ZoomBounds) -> Self {
        Self {
            views: Mutex::new(HashMap::new()),
            cell_size,
            zoom_bounds,
        }
    }

    // блокировка никогда не держится через await
    fn lock(&self) -> MutexGuard<'_, HashMap<i64, TrackedView<V>>> {
        self.views.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Выполняет `f` над представлением площадки, создавая его при первом обращении.
    fn with_view<T>(&self, venue_id: i64, f: impl FnOnce(&mut OccupancyView<V>) -> T) -> T {
        let mut views = self.lock();
        if !views.contains_key(&venue_id) && views.len() >= MAX_TRACKED_VIEWS {
            evict_oldest(&mut views);
        }
        let tracked = views.entry(venue_id).or_insert_with(|| TrackedView {
            view: OccupancyView::new(self.cell_size, self.zoom_bounds),
            touched: Instant::now(),
        });
        tracked.touched = Instant::now();
        f(&mut tracked.view)
    }

    fn begin(&self, venue_id: i64) -> Generation {
        self.with_view(venue_id, OccupancyView::begin_refresh)
    }

    /// Применяет ответы своего поколения и отдаёт актуальное состояние карты.
    /// Для устаревшего поколения ответы отбрасываются, а кадр строится из
    /// того, что уже принесли более поздние запросы.
    fn complete<E: Display>(
        &self,
        venue_id: i64,
        generation: Generation,
        positions: Result<Vec<SeatPosition>, E>,
        values: Result<HashMap<SeatNumber, V>, E>,
    ) -> MapSnapshot<V> {
        self.with_view(venue_id, |view| {
            // представление вытеснили, пока шёл запрос: этот ответ для него первый
            let generation = if view.current_generation().value() == 0 {
                view.begin_refresh()
            } else {
                generation
            };
            view.apply_positions(generation, positions);
            view.apply_values(generation, values);
            MapSnapshot {
                frame: view.frame(),
                zoom: view.zoom_state(),
            }
        })
    }

    fn gesture(&self, venue_id: i64, event: &TouchEvent) -> GestureOutcome {
        self.with_view(venue_id, |view| {
            let response = view.zoom_mut().handle(event);
            GestureOutcome {
                consumed: response == TouchResponse::Consumed,
                zoom: view.zoom_state(),
            }
        })
    }

    fn len(&self) -> usize {
        self.lock().len()
    }
}

fn evict_oldest<V>(views: &mut HashMap<i64, TrackedView<V>>) {
    let oldest = views
        .iter()
        .min_by_key(|(_, tracked)| tracked.touched)
        .map(|(venue_id, _)| *venue_id);
    if let Some(venue_id) = oldest {
        debug!("evicting occupancy view of venue {}", venue_id);
        views.remove(&venue_id);
    }
}

#[derive(Clone)]
pub struct SeatFeedService {
    upstream: UpstreamClient,
    cache: Option<CacheService>,
    cell_size: u32,
    status_views: Arc<ViewRegistry<SeatStatus>>,
    usage_views: Arc<ViewRegistry<SeatUsage>>,
}

impl SeatFeedService {
    pub fn new(upstream: UpstreamClient, cache: Option<CacheService>, cell_size: u32, zoom_bounds: ZoomBounds) -> Self {
        Self {
            upstream,
            cache,
            cell_size,
            status_views: Arc::new(ViewRegistry::new(cell_size, zoom_bounds)),
            usage_views: Arc::new(ViewRegistry::new(cell_size, zoom_bounds)),
        }
    }

    pub fn cell_size(&self) -> u32 {
        self.cell_size
    }

    /// Позиции мест площадки: сначала кеш, потом бэкенд.
    pub async fn positions(&self, venue_id: i64) -> Result<Vec<SeatPosition>, UpstreamError> {
        if let Some(cache) = &self.cache {
            if let Some(positions) = cache.get_positions(venue_id).await {
                debug!("position cache hit for venue {}", venue_id);
                return Ok(positions);
            }
        }

        let positions = self.upstream.seat_positions(venue_id).await?;
        // пустой ответ не кешируем: площадку с этим id могут создать позже
        if let (Some(cache), false) = (&self.cache, positions.is_empty()) {
            cache.save_positions(venue_id, &positions).await;
        }
        Ok(positions)
    }

    /// Текущая занятость мест.
    pub async fn status_frame(&self, venue_id: i64) -> MapSnapshot<SeatStatus> {
        let generation = self.status_views.begin(venue_id);

        let (positions, statuses) = futures::join!(
            self.positions(venue_id),
            self.upstream.seat_statuses(venue_id)
        );
        let statuses = statuses.map(|feed| {
            feed.into_iter()
                .map(|(seat, occupied)| (seat, SeatStatus::from(occupied)))
                .collect::<HashMap<SeatNumber, SeatStatus>>()
        });

        self.status_views.complete(venue_id, generation, positions, statuses)
    }

    /// Средняя загрузка мест за диапазон дат. Смена диапазона - новое поколение
    /// той же карты.
    pub async fn usage_frame(&self, venue_id: i64, start: NaiveDate, end: NaiveDate) -> MapSnapshot<SeatUsage> {
        let generation = self.usage_views.begin(venue_id);

        let (positions, usage) = futures::join!(
            self.positions(venue_id),
            self.upstream.seat_usage(venue_id, start, end)
        );
        let usage = usage.map(|feed| {
            feed.into_iter()
                .map(|(seat, percent)| (seat, SeatUsage::from(percent)))
                .collect::<HashMap<SeatNumber, SeatUsage>>()
        });

        self.usage_views.complete(venue_id, generation, positions, usage)
    }

    pub fn status_gesture(&self, venue_id: i64, event: &TouchEvent) -> GestureOutcome {
        self.status_views.gesture(venue_id, event)
    }

    pub fn usage_gesture(&self, venue_id: i64, event: &TouchEvent) -> GestureOutcome {
        self.usage_views.gesture(venue_id, event)
    }

    /// Сколько карт сейчас в памяти (статусных, тепловых).
    pub fn tracked_views(&self) -> (usize, usize) {
        (self.status_views.len(), self.usage_views.len())
    }
}
