use crate::block::*;
use crate::comm::*;
use crate::error::*;
use crate::util::*;
use rayon::prelude::*;

/// How one piece of block data is exchanged, chosen at registration.
pub enum CommInfo {
    Buffered(Box<dyn PackInfo>),
    Datatype(Box<dyn DatatypeInfo>),
}

impl CommInfo {
    fn threadsafe_receiving(&self) -> bool {
        match self {
            CommInfo::Buffered(info) => info.threadsafe_receiving(),
            CommInfo::Datatype(_) => true,
        }
    }
}

enum Payload {
    Packed(RecvBuffer),
    Local,
    Datatype,
}

/// One message of one info from `sender` to its neighbour `receiver`
/// in `dir`.
struct Message {
    sender: BlockId,
    receiver: BlockId,
    dir: Direction,
    info: usize,
    payload: Payload,
}

struct InFlight {
    /// Packed messages, indexed by receiving block.
    mailboxes: Vec<Vec<Message>>,
    /// Messages that need both blocks at once.
    paired: Vec<Message>,
}

/// Halo exchange over all blocks of a forest.
///
/// `start_communication` packs every outgoing message, `wait` delivers
/// them. Sweeps over cells that do not depend on ghost layers may run
/// in between.
pub struct UniformScheme {
    infos: Vec<CommInfo>,
    directions: Vec<Direction>,
    local_shortcut: bool,
    in_flight: Option<InFlight>,
}

impl UniformScheme {
    pub fn new(directions: &[Direction]) -> Self {
        UniformScheme {
            infos: Vec::new(),
            directions: directions
                .iter()
                .copied()
                .filter(|d| *d != Direction::C)
                .collect(),
            local_shortcut: false,
            in_flight: None,
        }
    }

    /// Exchange with all 26 neighbours.
    pub fn all_neighbors() -> Self {
        Self::new(&Direction::NEIGHBORS)
    }

    /// Exchange between distinct blocks without a serialized buffer.
    pub fn with_local_shortcut(mut self, enabled: bool) -> Self {
        self.local_shortcut = enabled;
        self
    }

    pub fn add_info(&mut self, info: CommInfo) -> Result<()> {
        if self.in_flight.is_some() {
            return Err(HaloError::CommunicationInFlight);
        }
        self.infos.push(info);
        Ok(())
    }

    pub fn add_pack_info<P: PackInfo + 'static>(
        &mut self,
        info: P,
    ) -> Result<()> {
        self.add_info(CommInfo::Buffered(Box::new(info)))
    }

    pub fn add_datatype_info<D: DatatypeInfo + 'static>(
        &mut self,
        info: D,
    ) -> Result<()> {
        self.add_info(CommInfo::Datatype(Box::new(info)))
    }

    pub fn directions(&self) -> &[Direction] {
        &self.directions
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.is_some()
    }

    fn outgoing(
        &self,
        forest: &BlockForest,
        block: &Block,
    ) -> Result<Vec<Message>> {
        let mut messages = Vec::new();
        for &dir in &self.directions {
            let Some(receiver) = forest.neighbor(block.id(), dir) else {
                continue;
            };
            for (i, info) in self.infos.iter().enumerate() {
                let shortcut =
                    self.local_shortcut && receiver != block.id();
                let payload = match info {
                    CommInfo::Buffered(_) if shortcut => Payload::Local,
                    CommInfo::Buffered(pack_info) => {
                        let size = pack_info.size(dir, block)?;
                        let mut buffer = SendBuffer::with_capacity(size);
                        pack_info.pack(dir, block, &mut buffer)?;
                        tracing::trace!(
                            sender = %block.id(),
                            %receiver,
                            %dir,
                            scalars = buffer.len(),
                            "packed message"
                        );
                        Payload::Packed(buffer.into())
                    }
                    CommInfo::Datatype(_) => Payload::Datatype,
                };
                messages.push(Message {
                    sender: block.id(),
                    receiver,
                    dir,
                    info: i,
                    payload,
                });
            }
        }
        Ok(messages)
    }

    /// Pack all outgoing messages of all blocks.
    pub fn start_communication(&mut self, forest: &BlockForest) -> Result<()> {
        profiling::scope!("start_communication");
        if self.in_flight.is_some() {
            return Err(HaloError::CommunicationInFlight);
        }
        let outgoing = forest
            .blocks()
            .par_iter()
            .map(|block| self.outgoing(forest, block))
            .collect::<Result<Vec<_>>>()?;

        let mut mailboxes: Vec<Vec<Message>> =
            (0..forest.len()).map(|_| Vec::new()).collect();
        let mut paired = Vec::new();
        for message in outgoing.into_iter().flatten() {
            match message.payload {
                Payload::Packed(_) => {
                    mailboxes[message.receiver.0].push(message)
                }
                Payload::Local | Payload::Datatype => paired.push(message),
            }
        }
        tracing::trace!(
            packed = mailboxes.iter().map(Vec::len).sum::<usize>(),
            paired = paired.len(),
            "communication started"
        );
        self.in_flight = Some(InFlight { mailboxes, paired });
        Ok(())
    }

    fn receive(
        &self,
        block: &mut Block,
        mailbox: &mut [Message],
    ) -> Result<()> {
        for message in mailbox.iter_mut() {
            if let (CommInfo::Buffered(info), Payload::Packed(buffer)) =
                (&self.infos[message.info], &mut message.payload)
            {
                info.unpack(message.dir.inverse(), buffer, block)?;
            }
        }
        Ok(())
    }

    fn deliver_paired(
        &self,
        forest: &mut BlockForest,
        message: &Message,
    ) -> Result<()> {
        match &self.infos[message.info] {
            CommInfo::Buffered(info) => {
                let (sender, receiver) =
                    forest.pair_mut(message.sender, message.receiver)?;
                info.communicate_local(sender, receiver, message.dir)
            }
            CommInfo::Datatype(info) => {
                let moved = if message.sender == message.receiver {
                    let block = forest.block_mut(message.sender)?;
                    info.communicate_self(message.dir, block)?
                } else {
                    let recv_dir = message.dir.inverse();
                    let sender = forest.block(message.sender)?;
                    let send_type = info.send_datatype(message.dir, sender)?;
                    let send_ptr = info.send_pointer(message.dir, sender)?;
                    let receiver = forest.block(message.receiver)?;
                    let recv_type = info.recv_datatype(recv_dir, receiver)?;
                    let receiver = forest.block_mut(message.receiver)?;
                    let recv_ptr = info.recv_pointer(recv_dir, receiver)?;
                    // SAFETY: sender and receiver are distinct blocks, so
                    // the pointers refer to disjoint live storage the
                    // datatypes were derived from.
                    unsafe {
                        transfer(&send_ptr, &send_type, &recv_ptr, &recv_type)?
                    }
                };
                tracing::trace!(
                    sender = %message.sender,
                    receiver = %message.receiver,
                    dir = %message.dir,
                    scalars = moved,
                    "datatype transfer"
                );
                Ok(())
            }
        }
    }

    /// Deliver every message of the running exchange.
    pub fn wait(&mut self, forest: &mut BlockForest) -> Result<()> {
        profiling::scope!("wait");
        let InFlight {
            mut mailboxes,
            paired,
        } = self
            .in_flight
            .take()
            .ok_or(HaloError::NoCommunicationInFlight)?;
        if mailboxes.len() != forest.len() {
            return Err(HaloError::InvalidForest {
                reason: format!(
                    "exchange started on {} blocks, waited on {}",
                    mailboxes.len(),
                    forest.len()
                ),
            });
        }

        if self.infos.iter().all(CommInfo::threadsafe_receiving) {
            forest
                .blocks_mut()
                .par_iter_mut()
                .zip(mailboxes.par_iter_mut())
                .try_for_each(|(block, mailbox)| self.receive(block, mailbox))?;
        } else {
            let blocks = forest.blocks_mut().iter_mut();
            for (block, mailbox) in blocks.zip(mailboxes.iter_mut()) {
                self.receive(block, mailbox)?;
            }
        }

        for message in &paired {
            self.deliver_paired(forest, message)?;
        }
        Ok(())
    }

    /// Blocking exchange.
    pub fn communicate(&mut self, forest: &mut BlockForest) -> Result<()> {
        self.start_communication(forest)?;
        self.wait(forest)
    }
}

#[cfg(test)]
mod unit_tests {
    use super::*;
    use crate::field::*;

    fn forest(periodic: [bool; 3]) -> (BlockForest, BlockDataId) {
        let mut forest = BlockForest::new([2, 1, 1], periodic).unwrap();
        let shape = FieldShape::new([3, 3, 3], 2, 1).unwrap();
        let id = forest.add_field::<CellMajor>("f", shape).unwrap();
        for block in forest.blocks_mut() {
            let base = block.id().0 as f64 * 1000.0;
            let field = block.get_data_mut::<Field<CellMajor>>(id).unwrap();
            field.par_set_values(
                |c, i| {
                    let cell = (c[0] * 100 + c[1] * 10 + c[2]) as f64;
                    base + cell + i as f64 * 0.5
                },
                16,
            );
        }
        (forest, id)
    }

    fn check_west_ghost(forest: &BlockForest, id: BlockDataId) {
        let west = forest.blocks()[0].get_data::<Field<CellMajor>>(id).unwrap();
        let east = forest.blocks()[1].get_data::<Field<CellMajor>>(id).unwrap();
        for y in 0..3 {
            for z in 0..3 {
                for c in 0..2 {
                    assert_eq!(
                        east.get(&vector![-1, y, z], c),
                        west.get(&vector![2, y, z], c)
                    );
                    assert_eq!(
                        west.get(&vector![3, y, z], c),
                        east.get(&vector![0, y, z], c)
                    );
                }
            }
        }
    }

    #[test]
    fn buffered_test() {
        let (mut forest, id) = forest([false; 3]);
        let mut scheme = UniformScheme::all_neighbors();
        let info = FieldPackInfo::<CellMajor>::for_field(id, 2).unwrap();
        scheme.add_pack_info(info).unwrap();
        scheme.communicate(&mut forest).unwrap();
        check_west_ghost(&forest, id);

        // Non periodic outer ghost layers are untouched.
        let west = forest.blocks()[0].get_data::<Field<CellMajor>>(id).unwrap();
        assert_eq!(west.get(&vector![-1, 1, 1], 0), -100.0 + 11.0);
    }

    #[test]
    fn local_shortcut_test() {
        let (mut forest, id) = forest([false; 3]);
        let mut scheme =
            UniformScheme::all_neighbors().with_local_shortcut(true);
        let info = FieldPackInfo::<CellMajor>::for_field(id, 2).unwrap();
        scheme.add_pack_info(info).unwrap();
        scheme.communicate(&mut forest).unwrap();
        check_west_ghost(&forest, id);
    }

    #[test]
    fn datatype_test() {
        let (mut forest, id) = forest([false; 3]);
        let mut scheme = UniformScheme::all_neighbors();
        let info = FieldDatatypeInfo::<CellMajor>::for_field(id, 2).unwrap();
        scheme.add_datatype_info(info).unwrap();
        scheme.communicate(&mut forest).unwrap();
        check_west_ghost(&forest, id);
    }

    #[test]
    fn periodic_self_test() {
        let mut forest = BlockForest::new([1, 1, 1], [true; 3]).unwrap();
        let shape = FieldShape::new([3, 3, 3], 1, 1).unwrap();
        let id = forest.add_field::<CellMajor>("f", shape).unwrap();
        forest.blocks_mut()[0]
            .get_data_mut::<Field<CellMajor>>(id)
            .unwrap()
            .par_set_values(|c, _| (c[0] * 100 + c[1] * 10 + c[2]) as f64, 8);
        let mut scheme =
            UniformScheme::all_neighbors().with_local_shortcut(true);
        let info = FieldPackInfo::<CellMajor>::for_field(id, 1).unwrap();
        scheme.add_pack_info(info).unwrap();
        scheme.communicate(&mut forest).unwrap();

        let field =
            forest.blocks()[0].get_data::<Field<CellMajor>>(id).unwrap();
        assert_eq!(field.get(&vector![-1, 0, 0], 0), 200.0);
        assert_eq!(field.get(&vector![3, 3, 3], 0), 0.0);
        assert_eq!(field.get(&vector![-1, 3, -1], 0), 202.0);
    }

    #[test]
    fn periodic_self_datatype_test() {
        let mut forest = BlockForest::new([1, 1, 1], [true; 3]).unwrap();
        let shape = FieldShape::new([3, 3, 3], 2, 1).unwrap();
        let id = forest.add_field::<CellMajor>("f", shape).unwrap();
        forest.blocks_mut()[0]
            .get_data_mut::<Field<CellMajor>>(id)
            .unwrap()
            .par_set_values(
                |c, i| (c[0] * 100 + c[1] * 10 + c[2]) as f64 + i as f64,
                8,
            );
        let mut scheme = UniformScheme::all_neighbors();
        scheme
            .add_datatype_info(
                FieldDatatypeInfo::<CellMajor>::for_field(id, 2).unwrap(),
            )
            .unwrap();
        scheme.communicate(&mut forest).unwrap();

        let field =
            forest.blocks()[0].get_data::<Field<CellMajor>>(id).unwrap();
        assert_eq!(field.get(&vector![-1, 0, 0], 0), 200.0);
        assert_eq!(field.get(&vector![-1, 0, 0], 1), 201.0);
        assert_eq!(field.get(&vector![3, 3, 3], 1), 1.0);
        assert_eq!(field.get(&vector![-1, 3, -1], 0), 202.0);
        assert_eq!(field.get(&vector![1, -1, 1], 1), 122.0);
    }

    #[test]
    fn protocol_test() {
        let (mut forest, id) = forest([false; 3]);
        let mut scheme = UniformScheme::all_neighbors();
        let info = FieldPackInfo::<CellMajor>::for_field(id, 2).unwrap();
        scheme.add_pack_info(info).unwrap();
        assert!(matches!(
            scheme.wait(&mut forest),
            Err(HaloError::NoCommunicationInFlight)
        ));
        scheme.start_communication(&forest).unwrap();
        assert!(scheme.is_in_flight());
        assert!(matches!(
            scheme.start_communication(&forest),
            Err(HaloError::CommunicationInFlight)
        ));
        scheme.wait(&mut forest).unwrap();
        assert!(!scheme.is_in_flight());
    }
}
