use garage_schema::TicketId;

/// Produces ticket identifiers. Uniqueness matters, format does not.
pub trait IdGenerator: Send {
    fn new_id(&mut self) -> TicketId;
}

/// `T-000001`, `T-000002`, ... Readable ids for sessions and tests.
#[derive(Debug, Clone, Default)]
pub struct SequentialIds {
    next: u64,
}

impl SequentialIds {
    pub fn new() -> Self {
        Self::default()
    }
}

impl IdGenerator for SequentialIds {
    fn new_id(&mut self) -> TicketId {
        self.next += 1;
        TicketId::new(format!("T-{:06}", self.next))
    }
}

/// Opaque 16-hex-character ids: blake3 over a per-instance seed and a counter.
#[derive(Debug, Clone)]
pub struct HashIds {
    seed: [u8; 32],
    counter: u64,
}

impl HashIds {
    pub fn new(seed: &[u8]) -> Self {
        Self {
            seed: *blake3::hash(seed).as_bytes(),
            counter: 0,
        }
    }

    /// Seed from the current time and process id.
    pub fn from_entropy() -> Self {
        let nanos = chrono::Utc::now()
            .timestamp_nanos_opt()
            .unwrap_or_default()
            .to_le_bytes();
        let pid = std::process::id().to_le_bytes();
        Self::new(&[nanos.as_slice(), pid.as_slice()].concat())
    }
}

impl IdGenerator for HashIds {
    fn new_id(&mut self) -> TicketId {
        self.counter += 1;
        let mut hasher = blake3::Hasher::new_keyed(&self.seed);
        hasher.update(&self.counter.to_le_bytes());
        let hex = hasher.finalize().to_hex();
        TicketId::new(&hex[..16])
    }
}

impl<G: IdGenerator + ?Sized> IdGenerator for Box<G> {
    fn new_id(&mut self) -> TicketId {
        (**self).new_id()
    }
}
