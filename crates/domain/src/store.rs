use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use cqrs_es::{Aggregate, AggregateContext, AggregateError, EventEnvelope, EventStore};

type Streams<A> = HashMap<String, Vec<EventEnvelope<A>>>;

/// In-process event log, one stream per aggregate id.
///
/// Commits are checked against the sequence the aggregate was loaded at, so a
/// stale writer gets `AggregateConflict` instead of overwriting newer events.
pub struct EventLog<A: Aggregate> {
    streams: Arc<RwLock<Streams<A>>>,
}

impl<A: Aggregate> Default for EventLog<A> {
    fn default() -> Self {
        Self {
            streams: Arc::default(),
        }
    }
}

impl<A: Aggregate> Clone for EventLog<A> {
    fn clone(&self) -> Self {
        Self {
            streams: Arc::clone(&self.streams),
        }
    }
}

/// Aggregate state plus the last sequence it was rebuilt from.
pub struct EventLogContext<A: Aggregate> {
    pub aggregate_id: String,
    pub aggregate: A,
    pub current_sequence: usize,
}

impl<A: Aggregate> AggregateContext<A> for EventLogContext<A> {
    fn aggregate(&self) -> &A {
        &self.aggregate
    }
}

impl<A: Aggregate> EventLog<A> {
    fn read(&self) -> Result<RwLockReadGuard<'_, Streams<A>>, AggregateError<A::Error>> {
        self.streams.read().map_err(|_| poisoned())
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Streams<A>>, AggregateError<A::Error>> {
        self.streams.write().map_err(|_| poisoned())
    }
}

fn poisoned<E: std::error::Error>() -> AggregateError<E> {
    AggregateError::UnexpectedError("event log lock poisoned".into())
}

#[async_trait]
impl<A: Aggregate> EventStore<A> for EventLog<A> {
    type AC = EventLogContext<A>;

    async fn load_events(
        &self,
        aggregate_id: &str,
    ) -> Result<Vec<EventEnvelope<A>>, AggregateError<A::Error>> {
        Ok(self.read()?.get(aggregate_id).cloned().unwrap_or_default())
    }

    async fn load_aggregate(
        &self,
        aggregate_id: &str,
    ) -> Result<EventLogContext<A>, AggregateError<A::Error>> {
        let mut aggregate = A::default();
        let mut current_sequence = 0;
        for envelope in self.load_events(aggregate_id).await? {
            current_sequence = envelope.sequence;
            aggregate.apply(envelope.payload);
        }

        Ok(EventLogContext {
            aggregate_id: aggregate_id.to_string(),
            aggregate,
            current_sequence,
        })
    }

    async fn commit(
        &self,
        events: Vec<A::Event>,
        context: EventLogContext<A>,
        metadata: HashMap<String, String>,
    ) -> Result<Vec<EventEnvelope<A>>, AggregateError<A::Error>> {
        if events.is_empty() {
            return Ok(Vec::new());
        }

        let mut streams = self.write()?;
        let stream = streams.entry(context.aggregate_id.clone()).or_default();
        let head = stream.last().map_or(0, |e| e.sequence);
        if head != context.current_sequence {
            return Err(AggregateError::AggregateConflict);
        }

        let committed: Vec<_> = events
            .into_iter()
            .zip(head + 1..)
            .map(|(payload, sequence)| EventEnvelope {
                aggregate_id: context.aggregate_id.clone(),
                sequence,
                payload,
                metadata: metadata.clone(),
            })
            .collect();
        stream.extend(committed.iter().cloned());

        Ok(committed)
    }
}
